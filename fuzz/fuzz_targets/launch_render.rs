#![no_main]

use libfuzzer_sys::fuzz_target;
use recast_core::types::ContainerDescriptor;
use recast_recreate::synthesize;

fuzz_target!(|data: &[u8]| {
    let Ok(descriptor) = serde_json::from_slice::<ContainerDescriptor>(data) else {
        return;
    };

    let spec = synthesize(&descriptor);
    let argv = spec.to_run_argv();

    // 한 줄 명령은 셸 파싱으로 같은 argv를 돌려줘야 합니다
    let line = spec.command_line();
    let parsed = shell_words::split(&line).expect("rendered command line must parse");
    assert_eq!(parsed.first().map(String::as_str), Some("docker"));
    assert_eq!(&parsed[1..], argv.as_slice());
});
