#![no_main]

use libfuzzer_sys::fuzz_target;
use sketch_session::protocol::ClientMessage;

fuzz_target!(|data: &[u8]| {
    // Raw bytes, including serde_json's own UTF-8 validation.
    let _ = serde_json::from_slice::<ClientMessage>(data);

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(msg) = serde_json::from_str::<ClientMessage>(s) {
            // Whatever parses must serialize again.
            let json = serde_json::to_string(&msg).expect("re-serialize");
            let _ = serde_json::from_str::<ClientMessage>(&json);
            let _ = msg.name();
        }
    }
});
