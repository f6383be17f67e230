//! Integration tests for PERIPHCONF decoding, validation and reporting

use periphconf_check::{
    load_periphconf, render_periphconf_table, render_validation_status, validate_periphconf, CheckError,
    FieldInfo, RegisterCatalog, RegisterInfo, TableStyle, ValidationStatus,
};

// ── Fixture ──────────────────────────────────────────────────────────────────

const PERM0: u32 = 0x5F92_0000;
const PERM1: u32 = 0x5F92_0004;
const GPIO_PIN_FEATURE: u32 = 0x5F92_0C04;
const PIN_CNF1: u32 = 0x5F93_8204;
const PIN_CNF_UNIMPL: u32 = 0x5F93_827C;
const MEMCONF_RET: u32 = 0x5F09_3004;
const TERMINATOR: u32 = 0xFFFF_FFFF;

/// Writable bits of an SPU PERM register: SECATTR, DMASEC, LOCK, OWNERID.
const PERM_MASK: u32 = 0x000F_0130;

fn perm_fields() -> Vec<FieldInfo> {
    [
        ("SECUREMAPPING", 0x3),
        ("DMA", 0xC),
        ("SECATTR", 0x10),
        ("DMASEC", 0x20),
        ("OWNERPROG", 0x40),
        ("LOCK", 0x100),
        ("OWNERID", 0xF_0000),
    ]
    .into_iter()
    .map(|(name, mask)| FieldInfo { name: name.into(), mask })
    .collect()
}

fn register(name: &str, mask: u32, default: u32, fields: Vec<FieldInfo>) -> RegisterInfo {
    RegisterInfo { name: name.into(), mask, default, fields }
}

fn catalog() -> RegisterCatalog {
    let mut catalog = RegisterCatalog::default();
    // User-selectable security, separate DMA attribute, programmable owner, locked.
    catalog.insert(PERM0, register("SPU131.PERIPH[0].PERM", PERM_MASK, 0x14A, perm_fields()));
    // Fixed secure mapping, DMA without separate attribute, fixed owner.
    catalog.insert(PERM1, register("SPU131.PERIPH[1].PERM", PERM_MASK, 0x005, perm_fields()));
    catalog.insert(
        GPIO_PIN_FEATURE,
        register(
            "SPU131.FEATURE.GPIO[0].PIN[1]",
            0x1F1,
            0x1,
            vec![
                FieldInfo { name: "SECATTR".into(), mask: 0x1 },
                FieldInfo { name: "OWNERID".into(), mask: 0xF0 },
                FieldInfo { name: "LOCK".into(), mask: 0x100 },
            ],
        ),
    );
    catalog.insert(PIN_CNF1, register("P0.PIN_CNF[1]", 0xFFFF_FFFF, 0x2, Vec::new()));
    catalog.insert(PIN_CNF_UNIMPL, register("P2.PIN_CNF[31]", 0xFFFF_FFFF, 0x0, Vec::new()));
    catalog.insert(MEMCONF_RET, register("MEMCONF.POWER[0].RET", 0xF, 0b1111, Vec::new()));
    catalog
}

fn blob(records: &[(u32, u32)]) -> Vec<u8> {
    records
        .iter()
        .flat_map(|(ptr, value)| [ptr.to_le_bytes(), value.to_le_bytes()].concat())
        .collect()
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Test that records after the terminator are ignored
#[test]
fn test_terminator_ends_table() {
    let catalog = catalog();
    let mut data = blob(&[(TERMINATOR, 0), (PIN_CNF1, 1)]);
    data.extend([0xDE, 0xAD]);

    let mut entries = load_periphconf(&catalog, &data).unwrap();
    assert!(entries.is_empty());
    assert_eq!(validate_periphconf(&mut entries).unwrap(), ValidationStatus::SUCCESS);
}

/// Test that a catalog name matching no register kind is reported as an error
#[test]
fn test_unclassifiable_catalog_name() {
    let mut catalog = catalog();
    catalog.insert(0x5000_0000, register("UARTE120.ENABLE", 0xF, 0, Vec::new()));

    let result = load_periphconf(&catalog, &blob(&[(0x5000_0000, 8)]));
    assert!(matches!(result, Err(CheckError::Classify(_))));
}

// ── Conflicts ────────────────────────────────────────────────────────────────

/// Test that conflicting writes to a plain register are non-fatal
#[test]
fn test_non_fatal_conflict() {
    let catalog = catalog();
    let data = blob(&[(PIN_CNF1, 1), (PERM0, 0x14A), (PIN_CNF1, 3)]);

    let mut entries = load_periphconf(&catalog, &data).unwrap();
    let status = validate_periphconf(&mut entries).unwrap();

    assert_eq!(status, ValidationStatus::CONFLICTING_VALUES_NON_FATAL);
    assert!(status.is_error());
    assert!(!status.is_fatal_error());
    assert_eq!(entries[0].status, ValidationStatus::CONFLICTING_VALUES_NON_FATAL);
    assert_eq!(entries[1].status, ValidationStatus::SUCCESS);
    assert_eq!(entries[2].status, ValidationStatus::CONFLICTING_VALUES_NON_FATAL);
}

/// Test that repeated identical writes are accepted
#[test]
fn test_duplicate_identical_writes() {
    let catalog = catalog();
    let mut entries = load_periphconf(&catalog, &blob(&[(PIN_CNF1, 1), (PIN_CNF1, 1)])).unwrap();
    assert_eq!(validate_periphconf(&mut entries).unwrap(), ValidationStatus::SUCCESS);
}

/// Test that conflicting writes to an SPU register are fatal
#[test]
fn test_fatal_spu_conflict() {
    let catalog = catalog();
    let data = blob(&[(GPIO_PIN_FEATURE, 0x1), (GPIO_PIN_FEATURE, 0x0)]);

    let mut entries = load_periphconf(&catalog, &data).unwrap();
    let status = validate_periphconf(&mut entries).unwrap();

    assert_eq!(status, ValidationStatus::CONFLICTING_VALUES_FATAL);
    assert!(status.is_fatal_error());
    assert!(entries.iter().all(|e| e.status == ValidationStatus::CONFLICTING_VALUES_FATAL));
}

// ── Catalog checks ───────────────────────────────────────────────────────────

/// Test that a pointer missing from the catalog is fatal
#[test]
fn test_unrecognized_register() {
    let catalog = catalog();
    let mut entries = load_periphconf(&catalog, &blob(&[(0x1234_0000, 1)])).unwrap();
    let status = validate_periphconf(&mut entries).unwrap();

    assert_eq!(status, ValidationStatus::UNRECOGNIZED_REGISTER);
    assert!(status.is_fatal_error());
}

/// Test that a register with a zero reset value is unimplemented
#[test]
fn test_unimplemented_register() {
    let catalog = catalog();
    let mut entries = load_periphconf(&catalog, &blob(&[(PIN_CNF_UNIMPL, 2)])).unwrap();
    assert_eq!(
        validate_periphconf(&mut entries).unwrap(),
        ValidationStatus::UNIMPLEMENTED_REGISTER
    );
}

// ── Register checks ──────────────────────────────────────────────────────────

/// Test that changing a default-locked PERM register is flagged
#[test]
fn test_spu_perm_locked() {
    let catalog = catalog();
    let mut entries = load_periphconf(&catalog, &blob(&[(PERM0, 0x15A)])).unwrap();
    assert_eq!(
        validate_periphconf(&mut entries).unwrap(),
        ValidationStatus::SPU_REGISTER_LOCKED
    );

    let mut entries = load_periphconf(&catalog, &blob(&[(PERM0, 0x14A)])).unwrap();
    assert_eq!(validate_periphconf(&mut entries).unwrap(), ValidationStatus::SUCCESS);
}

/// Test that fields fixed by hardware cannot be changed
#[test]
fn test_spu_perm_fields_not_applicable() {
    let catalog = catalog();
    let mut entries = load_periphconf(&catalog, &blob(&[(PERM1, 0x0003_0035)])).unwrap();
    let status = validate_periphconf(&mut entries).unwrap();

    assert_eq!(
        status,
        ValidationStatus::SPU_PERM_DMASEC_NOT_APPLICABLE
            | ValidationStatus::SPU_PERM_OWNERID_NOT_APPLICABLE
            | ValidationStatus::SPU_PERM_SECATTR_NOT_APPLICABLE
    );
    assert!(!status.contains(ValidationStatus::SPU_REGISTER_LOCKED));
}

/// Test that MEMCONF power writes must match the present regions
#[test]
fn test_memconf_region_not_present() {
    let catalog = catalog();
    let mut entries = load_periphconf(&catalog, &blob(&[(MEMCONF_RET, 0b1011)])).unwrap();
    assert_eq!(
        validate_periphconf(&mut entries).unwrap(),
        ValidationStatus::MEMCONF_POWER_REGION_NOT_PRESENT
    );

    let mut entries = load_periphconf(&catalog, &blob(&[(MEMCONF_RET, 0b1111)])).unwrap();
    assert_eq!(validate_periphconf(&mut entries).unwrap(), ValidationStatus::SUCCESS);
}

// ── Reporting ────────────────────────────────────────────────────────────────

/// Test that the register table decodes writable fields and marks errors
#[test]
fn test_regs_table() {
    let catalog = catalog();
    let mut entries = load_periphconf(&catalog, &blob(&[(PERM0, 0x15A), (PIN_CNF1, 2)])).unwrap();
    let status = validate_periphconf(&mut entries).unwrap();

    let failed: Vec<_> = entries.iter().filter(|e| e.status.is_error()).collect();
    let table = render_periphconf_table(failed, TableStyle::Regs);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("E  Index  Register"));
    assert!(lines[2].starts_with("X      0  SPU131.PERIPH[0].PERM"));
    assert!(lines[2].contains("SECATTR=1, DMASEC=0, LOCK=1, OWNERID=0"));
    assert!(lines[2].ends_with("SPU_REGISTER_LOCKED"));

    let description = render_validation_status(status);
    assert!(description.starts_with("SPU_REGISTER_LOCKED:\n  The PERIPHCONF entry targets a SPU register"));
}
