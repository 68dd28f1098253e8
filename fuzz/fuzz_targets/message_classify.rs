#![no_main]

use libfuzzer_sys::fuzz_target;
use logrelay_watcher::MessageClassifier;

fuzz_target!(|data: &[u8]| {
    let Ok(classifier) = MessageClassifier::new() else {
        return;
    };
    let text = String::from_utf8_lossy(data);
    let class = classifier.classify(&text);
    if let Some(service) = class.service() {
        let file_name = service.log_file_name();
        assert!(file_name.ends_with(".log"));
        assert!(!file_name.contains('/'));
        assert!(!file_name.contains('\\'));
        assert!(!service.as_str().contains(".."));
    }
});
