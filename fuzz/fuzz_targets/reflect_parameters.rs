#![no_main]

use ferrous_inject::annotate::reflect_parameters;
use ferrous_inject::Injectable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    let names = reflect_parameters(source);
    for name in &names {
        assert!(!name.is_empty());
        assert!(!name.chars().any(char::is_whitespace));
    }

    // Annotation goes through the same parser and caches its result
    let unit = Injectable::from_source(source, |_| Ok(()));
    assert_eq!(unit.annotate(false).unwrap(), names);
    assert_eq!(unit.annotate(false).unwrap(), names);
    assert!(unit.annotate(true).is_err());
});
