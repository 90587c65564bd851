#![no_main]

use libfuzzer_sys::fuzz_target;
use recast_core::filter::{NameFilter, NameList, parse_names};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let names = parse_names(raw);
    for name in &names {
        assert!(!name.is_empty());
        assert!(!name.contains([',', ';']));
        assert!(!name.chars().any(char::is_whitespace));
    }

    // 모든 토큰은 자기 자신의 only 목록에 포함되고 exclude 목록에서는 제외됩니다
    let list = NameList::parse(raw);
    let only = NameFilter::new(&list, &NameList::default());
    let exclude = NameFilter::new(&NameList::default(), &list);
    for name in &names {
        assert!(only.includes(name));
        assert!(!exclude.includes(name));
    }
});
