use super::*;

fn exact(raw: &str) -> VersionData {
    parse(raw, true).unwrap_or_else(|e| panic!("{raw} should parse: {e}"))
}

#[test]
fn test_parse_legacy_update() {
    let v = exact("8u212");
    assert_eq!(v.major(), 8);
    assert_eq!(v.minor(), 0);
    assert_eq!(v.security(), 212);
    assert_eq!(v.build(), 0);
    assert_eq!(v.semver(), "8.0.212");
    assert_eq!(v.openjdk_version(), "8u212");
}

#[test]
fn test_parse_legacy_with_build() {
    let v = exact("jdk8u212-b03");
    assert_eq!(v.major(), 8);
    assert_eq!(v.security(), 212);
    assert_eq!(v.build(), 3);
    assert_eq!(v.semver(), "8.0.212+3");
}

#[test]
fn test_parse_legacy_with_optional() {
    let v = exact("jdk8u162-b12_openj9-0.8.0");
    assert_eq!(v.build(), 12);
    assert_eq!(v.optional(), Some("openj9-0.8.0"));
    assert_eq!(v.semver(), "8.0.162+12.openj9-0.8.0");
}

#[test]
fn test_parse_dotted_exact() {
    let v = exact("jdk-11.0.5+10");
    assert_eq!(v.major(), 11);
    assert_eq!(v.minor(), 0);
    assert_eq!(v.security(), 5);
    assert_eq!(v.build(), 10);
    assert_eq!(v.patch(), None);
    assert_eq!(v.adopt_build_number(), None);
    assert_eq!(v.semver(), "11.0.5+10");
}

#[test]
fn test_parse_adopt_build_number() {
    let v = exact("11.0.5+10.1");
    assert_eq!(v.build(), 10);
    assert_eq!(v.adopt_build_number(), Some(1));
    assert_eq!(v.semver(), "11.0.5+10.1");
}

#[test]
fn test_parse_patch_folds_into_build_metadata() {
    let v = exact("jdk-11.0.9.1+1");
    assert_eq!(v.security(), 9);
    assert_eq!(v.patch(), Some(1));
    assert_eq!(v.build(), 1);
    assert_eq!(v.semver(), "11.0.9+101");
}

#[test]
fn test_parse_early_access() {
    let v = exact("jdk-18-ea+5");
    assert_eq!(v.major(), 18);
    assert_eq!(v.pre(), Some("ea"));
    assert_eq!(v.build(), 5);
    assert!(v.is_pre_release());
    assert_eq!(v.semver(), "18.0.0-ea+5");
}

#[test]
fn test_parse_legacy_alternate_suffix() {
    let v = exact("8u212-b04-201904231236");
    assert_eq!(v.security(), 212);
    assert_eq!(v.build(), 4);
    assert_eq!(v.optional(), Some("201904231236"));
}

#[test]
fn test_parse_nightly_tag() {
    let v = exact("jdk11u-2019-08-07-14-39");
    assert_eq!(v.major(), 11);
    assert_eq!(v.security(), 0);
    assert_eq!(v.build(), 0);
    assert_eq!(v.optional(), Some("2019-08-07-14-39"));
    assert_eq!(v.semver(), "11.0.0+2019-08-07-14-39");
}

#[test]
fn test_parse_non_exact_extracts_from_noise() {
    let v = parse("release notes for jdk-11.0.5+10 (final)", false).unwrap();
    assert_eq!(v.semver(), "11.0.5+10");

    let v = parse("OpenJDK8U-jdk_x64_linux_hotspot_8u212b04.tar.gz", false).unwrap();
    assert_eq!(v.major(), 8);
    assert_eq!(v.security(), 212);
}

#[test]
fn test_exact_rejects_surrounding_noise() {
    assert!(parse("release jdk-11.0.5+10", true).is_err());
}

#[test]
fn test_sanity_rejects_out_of_range_major() {
    let err = parse("150", true).unwrap_err();
    assert_eq!(err.input, "150");
    assert!(parse("150", false).is_err());
    assert!(parse("6u45", true).is_err());
}

#[test]
fn test_sanity_rejects_missing_security_and_build() {
    assert!(parse("8u0", true).is_err());
    assert!(parse("8u0", false).is_err());
    assert!(parse("jdk-11", true).is_err());
}

#[test]
fn test_parse_garbage_fails() {
    assert!(parse("", true).is_err());
    assert!(parse("not-a-version", false).is_err());
}

#[test]
fn test_semver_rederives_from_fields() {
    for raw in [
        "8u212",
        "jdk8u212-b03",
        "jdk-11.0.5+10",
        "11.0.5+10.1",
        "jdk-11.0.9.1+1",
        "jdk-18-ea+5",
        "jdk11u-2019-08-07-14-39",
    ] {
        let v = exact(raw);
        assert_eq!(render_semver(&v.fields()), v.semver(), "{raw}");
    }
}

#[test]
fn test_serde_recomputes_semver() {
    let v = exact("jdk-11.0.5+10");
    let mut json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["semver"], "11.0.5+10");

    json["semver"] = serde_json::Value::String("bogus".to_string());
    let back: VersionData = serde_json::from_value(json).unwrap();
    assert_eq!(back, v);
}

#[test]
fn test_equality_requires_same_source_string() {
    let a = exact("jdk-11.0.5+10");
    let b = exact("11.0.5+10");
    assert_eq!(a.fields(), b.fields());
    assert_ne!(a, b);
    assert_ne!(a.cmp(&b), Ordering::Equal);
}

#[test]
fn test_pre_release_sorts_before_final() {
    let ea = exact("11.0.5-ea+10");
    let ga = exact("11.0.5+10");
    assert!(ea < ga);
    assert!(ga > ea);
}

#[test]
fn test_ordering_by_numeric_fields() {
    let mut versions = vec![
        exact("jdk-11.0.5+10"),
        exact("8u212"),
        exact("jdk-11.0.4+11"),
        exact("jdk-11.0.5+10.2"),
        exact("jdk-17.0.1+12"),
        exact("jdk8u212-b03"),
    ];
    versions.sort();
    let semvers: Vec<_> = versions.iter().map(|v| v.semver().to_string()).collect();
    assert_eq!(
        semvers,
        vec![
            "8.0.212",
            "8.0.212+3",
            "11.0.4+11",
            "11.0.5+10",
            "11.0.5+10.2",
            "17.0.1+12",
        ]
    );
}

#[test]
fn test_comparator_is_total() {
    let versions: Vec<_> = [
        "8u212",
        "jdk8u212-b03",
        "jdk-11.0.5+10",
        "11.0.5+10",
        "11.0.5-ea+10",
        "11.0.5+10.1",
        "jdk-11.0.9.1+1",
        "jdk-18-ea+5",
        "jdk11u-2019-08-07-14-39",
        "8u212-b04-201904231236",
    ]
    .iter()
    .map(|raw| exact(raw))
    .collect();

    for a in &versions {
        for b in &versions {
            let outcomes = [a < b, a == b, a > b];
            assert_eq!(
                outcomes.iter().filter(|o| **o).count(),
                1,
                "{} vs {}",
                a.openjdk_version(),
                b.openjdk_version()
            );
            assert_eq!(a.cmp(b), b.cmp(a).reverse());
        }
    }
}
