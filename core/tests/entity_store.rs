//! Entity store tests: lender identity, catalog replace rules,
//! auto-created lender countries, dirty-flag read-and-clear.

use lendercache_core::{
    store::{DirtyFlags, EntityStore, LoanInfo},
    CacheError,
};

fn build(lender_id: &str) -> EntityStore {
    let _ = env_logger::builder().is_test(true).try_init();
    EntityStore::create(lender_id).expect("create store")
}

fn loan(id: u32, name: &str) -> LoanInfo<'_> {
    LoanInfo {
        id,
        name,
        loan_use: "buy seed",
        country_code: "KE",
        funded_amt: 20,
        loan_amt: 100,
    }
}

// ── Lender identity ─────────────────────────────────────────────

#[test]
fn setting_same_lender_id_keeps_profile() {
    let mut store = build("abc");
    store.set_lender_name("Ann").unwrap();
    store.set_lender_loc("Nairobi").unwrap();
    store.set_lender_loan_qty(7);

    store.set_lender_id("abc").unwrap();
    store.set_lender_id("abc").unwrap();

    assert_eq!(store.lender_name(), Some("Ann"));
    assert_eq!(store.lender_loc(), Some("Nairobi"));
    assert_eq!(store.lender_loan_qty(), 7);
}

#[test]
fn changing_lender_id_resets_dependent_state() {
    let mut store = build("abc");
    store.set_lender_name("Ann").unwrap();
    store.set_lender_loc("Nairobi").unwrap();
    store.set_lender_loan_qty(7);
    store.add_kiva_country("KE", "Kenya").unwrap();
    store.add_lender_country("KE", None).unwrap();
    store.add_lender_country("ZZ", Some("Zedland")).unwrap();
    assert_eq!(store.lender_country_qty(), 2);

    store.set_lender_id("xyz").unwrap();

    assert_eq!(store.lender_id(), "xyz");
    assert_eq!(store.lender_name(), None);
    assert_eq!(store.lender_loc(), None);
    assert_eq!(store.lender_loan_qty(), 0);
    assert!(
        store.countries().all(|c| !c.lender_supported),
        "Every country must lose lender support after an identity change"
    );
    // The catalog itself survives.
    assert_eq!(store.countries().count(), 2);
    assert_eq!(store.lender_country_qty(), 0);
}

#[test]
fn lender_id_change_marks_lender_aggregates_dirty() {
    let mut store = build("abc");
    store.set_lender_id("xyz").unwrap();
    let mods = store.modified();
    assert!(mods.lender_loan_qty);
    assert!(mods.lender_country_qty);
    assert!(!mods.kiva_country_qty);
    assert!(!mods.preferred_loan_qty);
}

#[test]
fn empty_lender_id_is_rejected() {
    let mut store = build("abc");
    let err = store.set_lender_id("").unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument { .. }), "got {err}");
    assert_eq!(store.lender_id(), "abc");
}

#[test]
fn malformed_lender_id_is_rejected() {
    let mut store = build("abc");
    let too_long = "x".repeat(25);
    for bad in ["ab", "has space", "dash-ed", too_long.as_str()] {
        let err = store.set_lender_id(bad).unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument { .. }), "{bad:?}: got {err}");
    }
    assert_eq!(store.lender_id(), "abc");
}

// ── Country catalog ─────────────────────────────────────────────

#[test]
fn kiva_country_is_replaced_by_code() {
    let mut store = build("abc");
    store.add_kiva_country("KE", "Kenya").unwrap();
    store.add_kiva_country("KE", "KenyaX").unwrap();

    assert_eq!(store.countries().count(), 1);
    assert_eq!(store.kiva_country_name("KE"), Some("KenyaX"));
    assert_eq!(store.kiva_country_qty(), 1);
}

#[test]
fn replacing_a_country_resets_lender_support() {
    let mut store = build("abc");
    store.add_kiva_country("KE", "Kenya").unwrap();
    store.add_lender_country("KE", None).unwrap();
    assert_eq!(store.lender_country_qty(), 1);

    store.add_kiva_country("KE", "Kenya").unwrap();

    let ke = store.country("KE").unwrap();
    assert!(ke.kiva_active);
    assert!(!ke.lender_supported);
    assert!(store.modified().lender_country_qty, "Lost support must be observable");
}

#[test]
fn unknown_lender_country_is_auto_created_inactive() {
    let mut store = build("abc");
    store.add_lender_country("ZZ", Some("Zedland")).unwrap();

    let zz = store.country("ZZ").expect("ZZ auto-created");
    assert_eq!(zz.code, "ZZ");
    assert_eq!(zz.name, "Zedland");
    assert!(!zz.kiva_active);
    assert!(zz.lender_supported);
    assert_eq!(store.kiva_country_qty(), 0);
    assert_eq!(store.lender_country_qty(), 1);
}

#[test]
fn unnamed_lender_country_takes_its_code_as_name() {
    let mut store = build("abc");
    store.add_lender_country("QQ", None).unwrap();
    assert_eq!(store.kiva_country_name("QQ"), Some("QQ"));
}

#[test]
fn known_lender_country_keeps_catalog_name() {
    let mut store = build("abc");
    store.add_kiva_country("PE", "Peru").unwrap();
    store.add_lender_country("PE", Some("Republic of Peru")).unwrap();

    let pe = store.country("PE").unwrap();
    assert_eq!(pe.name, "Peru");
    assert!(pe.kiva_active);
    assert!(pe.lender_supported);
}

#[test]
fn empty_country_code_is_rejected() {
    let mut store = build("abc");
    assert!(matches!(
        store.add_kiva_country("", "Nowhere"),
        Err(CacheError::InvalidArgument { .. })
    ));
    assert!(matches!(
        store.add_lender_country("", None),
        Err(CacheError::InvalidArgument { .. })
    ));
    assert_eq!(store.countries().count(), 0);
}

#[test]
fn missing_country_name_is_none() {
    let store = build("abc");
    assert_eq!(store.kiva_country_name("KE"), None);
}

// ── Country code lists ──────────────────────────────────────────

#[test]
fn lender_country_codes_are_joined_in_code_order() {
    let mut store = build("abc");
    for (code, name) in [("PE", "Peru"), ("AF", "Afghanistan"), ("KE", "Kenya"), ("AL", "Albania")] {
        store.add_kiva_country(code, name).unwrap();
    }
    store.add_lender_country("PE", None).unwrap();
    store.add_lender_country("AF", None).unwrap();

    assert_eq!(store.lender_country_codes(true).unwrap().as_deref(), Some("AF,PE"));
    assert_eq!(store.lender_country_codes(false).unwrap().as_deref(), Some("AL,KE"));
}

#[test]
fn lender_country_codes_is_none_when_empty() {
    let mut store = build("abc");
    assert_eq!(store.lender_country_codes(true).unwrap(), None);
    assert_eq!(store.lender_country_codes(false).unwrap(), None);

    store.add_kiva_country("KE", "Kenya").unwrap();
    assert_eq!(store.lender_country_codes(true).unwrap(), None);
    assert_eq!(store.lender_country_codes(false).unwrap().as_deref(), Some("KE"));
}

#[test]
fn single_supported_code_has_no_separator() {
    let mut store = build("abc");
    store.add_lender_country("KE", Some("Kenya")).unwrap();
    let codes = store.lender_country_codes(true).unwrap().unwrap();
    assert_eq!(codes, "KE");
    assert!(!codes.ends_with(','));
}

// ── Preferred loans ─────────────────────────────────────────────

#[test]
fn preferred_loan_is_replaced_by_id() {
    let mut store = build("abc");
    store.add_preferred_loan(loan(5, "Maryamu")).unwrap();
    store.add_preferred_loan(loan(5, "Maryamu Group")).unwrap();

    assert_eq!(store.preferred_loan_qty(), 1);
    assert_eq!(store.preferred_loan(5).unwrap().name, "Maryamu Group");
}

#[test]
fn clearing_preferred_loans_empties_and_marks_dirty() {
    let mut store = build("abc");
    store.add_preferred_loan(loan(1, "A")).unwrap();
    store.add_preferred_loan(loan(2, "B")).unwrap();
    assert_eq!(store.preferred_loan_qty(), 2);
    assert!(!store.modified().preferred_loan_qty);

    store.clear_preferred_loans();
    assert!(store.modified().preferred_loan_qty);
    assert_eq!(store.preferred_loan_qty(), 0);
    assert_eq!(store.preferred_loans().count(), 0);
}

#[test]
fn preferred_loan_walk_enumerates_from_zero() {
    let mut store = build("abc");
    for (id, name) in [(30, "C"), (10, "A"), (20, "B")] {
        store.add_preferred_loan(loan(id, name)).unwrap();
    }

    let seen: Vec<(usize, u32)> = store.preferred_loans().map(|v| (v.idx, v.data.id)).collect();
    assert_eq!(seen, vec![(0, 10), (1, 20), (2, 30)]);

    // A finished walk stays finished; a fresh call starts over.
    let mut walk = store.preferred_loans();
    assert_eq!(walk.len(), 3);
    while walk.next().is_some() {}
    assert!(walk.next().is_none());
    assert_eq!(store.preferred_loans().next().map(|v| v.idx), Some(0));
}

#[test]
fn loan_strings_are_copied() {
    let mut store = build("abc");
    {
        let name = String::from("Temporary");
        let info = LoanInfo { name: &name, ..loan(3, "") };
        store.add_preferred_loan(info).unwrap();
    }
    let rec = store.preferred_loan(3).unwrap();
    assert_eq!(rec.name, "Temporary");
    assert_eq!(rec.loan_use, "buy seed");
    assert_eq!(rec.remaining_amt(), 80);
}

// ── Dirty flags ─────────────────────────────────────────────────

#[test]
fn preferred_loan_flag_clears_on_first_read() {
    let mut store = build("abc");
    store.add_preferred_loan(loan(5, "Maryamu")).unwrap();
    assert!(store.modified().preferred_loan_qty);

    assert_eq!(store.preferred_loan_qty(), 1);
    assert!(!store.modified().preferred_loan_qty);

    assert_eq!(store.preferred_loan_qty(), 1);
    assert!(!store.modified().preferred_loan_qty);
}

#[test]
fn each_read_clears_only_its_own_flag() {
    let mut store = build("abc");
    store.add_kiva_country("KE", "Kenya").unwrap();
    store.add_lender_country("KE", None).unwrap();
    store.set_lender_loan_qty(3);
    store.add_preferred_loan(loan(1, "A")).unwrap();
    assert_eq!(
        store.modified(),
        DirtyFlags {
            kiva_country_qty:   true,
            lender_country_qty: true,
            lender_loan_qty:    true,
            preferred_loan_qty: true,
        }
    );

    store.kiva_country_qty();
    assert!(!store.modified().kiva_country_qty);
    assert!(store.modified().lender_country_qty);

    store.lender_country_qty();
    assert!(!store.modified().lender_country_qty);
    assert!(store.modified().lender_loan_qty);

    store.lender_loan_qty();
    assert!(!store.modified().lender_loan_qty);
    assert!(store.modified().preferred_loan_qty);

    store.preferred_loan_qty();
    assert!(!store.modified().any());
}

#[test]
fn non_quantity_reads_leave_flags_alone() {
    let mut store = build("abc");
    store.add_kiva_country("KE", "Kenya").unwrap();
    store.add_preferred_loan(loan(1, "A")).unwrap();
    let before = store.modified();

    let _ = store.kiva_country_name("KE");
    let _ = store.lender_country_codes(false).unwrap();
    let _ = store.preferred_loans().count();
    let _ = store.snapshot();

    assert_eq!(store.modified(), before);
}

#[test]
fn name_and_location_are_replaced() {
    let mut store = build("abc");
    store.set_lender_name("First").unwrap();
    store.set_lender_name("Second").unwrap();
    store.set_lender_loc("").unwrap();
    assert_eq!(store.lender_name(), Some("Second"));
    assert_eq!(store.lender_loc(), Some(""));
}

#[test]
fn destroy_consumes_the_store() {
    let mut store = build("abc");
    store.add_kiva_country("KE", "Kenya").unwrap();
    store.add_preferred_loan(loan(1, "A")).unwrap();
    store.destroy();
}
