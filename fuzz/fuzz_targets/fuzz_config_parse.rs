//! Fuzz target: campaign TOML config parsing + validation
//!
//! Run: cargo +nightly fuzz run fuzz_config_parse

#![no_main]
use ballot_core::CampaignConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = toml::from_str::<CampaignConfig>(s) {
            let _ = config.validate();
        }
    }
});
