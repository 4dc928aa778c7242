use eclio::ecl::version::UNDEFINED;
use eclio::ProjectVersion;

#[test]
fn parses_development_versions() {
    let version = ProjectVersion::parse("2017.05.2-dev.23");
    assert_eq!((version.major, version.minor, version.patch), (2017, 5, 2));
    assert_eq!(version.pre_release.as_deref(), Some("dev"));
    assert_eq!(version.dev, 23);
    assert!(version.is_defined());
    assert!(!version.is_release());
    assert_eq!(version.to_string(), "2017.5.2-dev.23");
}

#[test]
fn partial_and_invalid_versions() {
    let year_only = ProjectVersion::parse("2019");
    assert_eq!((year_only.major, year_only.minor, year_only.patch), (2019, UNDEFINED, UNDEFINED));
    assert!(year_only.is_release());
    assert_eq!(year_only.to_string(), "2019");

    let rc = ProjectVersion::parse("1.6.0-RC");
    assert_eq!(rc.pre_release.as_deref(), Some("RC"));
    assert_eq!(rc.dev, UNDEFINED);

    for text in ["", "abc", "1.2.3.4"] {
        let version = ProjectVersion::parse(text);
        assert!(!version.is_defined(), "{:?}", text);
        assert_eq!(version, ProjectVersion::default());
        assert_eq!(version.to_string(), "undefined");
    }
}

#[test]
fn versions_are_ordered() {
    let ordered = ["1.5.0", "1.6.0-RC", "1.6.0", "2016.11.0", "2017.05.0-dev.1", "2017.05.0-dev.2", "2017.05.0"];
    let versions: Vec<ProjectVersion> = ordered.iter().map(|v| ProjectVersion::parse(v)).collect();
    for pair in versions.windows(2) {
        assert!(pair[1].is_newer_than(&pair[0]), "{} should be newer than {}", pair[1], pair[0]);
        assert!(!pair[0].is_newer_than(&pair[1]));
    }

    let mut shuffled = versions.clone();
    shuffled.reverse();
    shuffled.sort();
    assert_eq!(shuffled, versions);

    assert!(ProjectVersion::parse("2.0").is_newer_than(&ProjectVersion::default()));
}

#[test]
fn from_str_never_fails() {
    let version: ProjectVersion = "2018.04.1".parse().unwrap();
    assert_eq!(version.to_string(), "2018.4.1");
    let undefined: ProjectVersion = "not a version".parse().unwrap();
    assert!(!undefined.is_defined());
}
