use sv7200_dashboard::prefs::{
    JsonFileStore, Language, MemoryStore, PreferenceStore, Preferences, DARK_MODE_KEY, LANGUAGE_KEY,
};

#[test]
fn test_defaults_when_nothing_stored() {
    let store = MemoryStore::new();
    let prefs = Preferences::load(&store);

    assert_eq!(prefs.language, Language::En);
    assert!(!prefs.dark_mode);
}

#[test]
fn test_invalid_values_fall_back_to_defaults() {
    let mut store = MemoryStore::new();
    store.set(LANGUAGE_KEY, "fr").unwrap();
    store.set(DARK_MODE_KEY, "maybe").unwrap();

    assert_eq!(Preferences::load(&store), Preferences::default());
}

#[test]
fn test_toggle_and_language_are_written_through() {
    let mut store = MemoryStore::new();
    let mut prefs = Preferences::load(&store);

    assert!(prefs.toggle_dark_mode(&mut store).unwrap());
    prefs.set_language(&mut store, Language::Pt).unwrap();

    assert_eq!(store.get(DARK_MODE_KEY).as_deref(), Some("true"));
    assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("pt"));

    assert!(!prefs.toggle_dark_mode(&mut store).unwrap());
    assert_eq!(store.get(DARK_MODE_KEY).as_deref(), Some("false"));
}

#[test]
fn test_language_parsing() {
    assert_eq!("pt".parse::<Language>().unwrap(), Language::Pt);
    assert_eq!(" en ".parse::<Language>().unwrap(), Language::En);
    assert!("EN-us".parse::<Language>().is_err());
    assert_eq!(Language::Pt.to_string(), "pt");
}

#[test]
fn test_json_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("preferences.json");

    {
        let mut store = JsonFileStore::open(&path);
        let mut prefs = Preferences::load(&store);
        prefs.set_language(&mut store, Language::Pt).unwrap();
        prefs.toggle_dark_mode(&mut store).unwrap();
    }

    let store = JsonFileStore::open(&path);
    let prefs = Preferences::load(&store);
    assert_eq!(prefs.language, Language::Pt);
    assert!(prefs.dark_mode);
}

#[test]
fn test_corrupt_json_store_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut store = JsonFileStore::open(&path);
    assert_eq!(Preferences::load(&store), Preferences::default());

    // Next write replaces the corrupt file.
    store.set(LANGUAGE_KEY, "pt").unwrap();
    let reopened = JsonFileStore::open(&path);
    assert_eq!(reopened.get(LANGUAGE_KEY).as_deref(), Some("pt"));
}
