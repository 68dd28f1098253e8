#![no_main]

use libfuzzer_sys::fuzz_target;
use logrelay_slack::MessageTimestamp;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Ok(ts) = raw.parse::<MessageTimestamp>() {
        let reparsed = ts
            .to_string()
            .parse::<MessageTimestamp>()
            .expect("rendered timestamp parses");
        assert_eq!(reparsed, ts);
    }
});
