// tests/packing_properties.rs
// Completeness and size bound over a spread of block sizes and limits.
use car_news_notifier::pack::{utf16_len, ItemBlock, MessagePacker};

const HEADER: &str = "🚗 新着\n\n";
const SEP: &str = "\n\n";

/// Deterministic mix of ASCII, kana and astral-plane emoji blocks.
fn blocks(n: usize, seed: usize) -> Vec<ItemBlock> {
    let pieces = ["a", "トヨタ", "🚗", "GR86 ", "ｸﾙﾏ", "🏁🏁"];
    (0..n)
        .map(|i| {
            let reps = 1 + (i * 7 + seed * 13) % 23;
            let text: String = (0..reps).map(|r| pieces[(i + r + seed) % pieces.len()]).collect();
            ItemBlock {
                id: format!("b{i}"),
                text,
            }
        })
        .collect()
}

#[test]
fn every_block_lands_once_in_order() {
    for seed in 0..5 {
        for limit in [20, 45, 80, 200, 5_000] {
            let input = blocks(17, seed);
            let units = MessagePacker::new(HEADER, SEP, limit).pack(&input);

            let ids: Vec<&str> = units
                .iter()
                .flat_map(|u| u.item_ids.iter().map(String::as_str))
                .collect();
            let expected: Vec<&str> = input.iter().map(|b| b.id.as_str()).collect();
            assert_eq!(ids, expected, "seed {seed} limit {limit}");

            // Stripping the header and splitting on the separator gives the blocks back.
            let texts: Vec<String> = units
                .iter()
                .flat_map(|u| {
                    u.text
                        .strip_prefix(HEADER)
                        .expect("unit starts with header")
                        .split(SEP)
                        .map(|t| t.trim_end().to_string())
                        .collect::<Vec<_>>()
                })
                .collect();
            let expected: Vec<String> = input.iter().map(|b| b.text.trim_end().to_string()).collect();
            assert_eq!(texts, expected, "seed {seed} limit {limit}");
        }
    }
}

#[test]
fn units_respect_the_limit_unless_single_oversized_block() {
    for seed in 0..5 {
        for limit in [20, 45, 80, 200] {
            let units = MessagePacker::new(HEADER, SEP, limit).pack(&blocks(17, seed));
            for u in &units {
                let len = utf16_len(&u.text);
                if u.item_ids.len() > 1 {
                    assert!(len <= limit, "multi-block unit of {len} > {limit}");
                    assert!(!u.oversized);
                }
                assert_eq!(u.oversized, len > limit);
            }
        }
    }
}

#[test]
fn greedy_fill_leaves_no_room_for_the_next_block() {
    let input = blocks(17, 3);
    let limit = 80;
    let units = MessagePacker::new(HEADER, SEP, limit).pack(&input);
    let sep = utf16_len(SEP);

    // For each closed unit, the following block would not have fit.
    let mut next = 0usize;
    for w in units.windows(2) {
        next += w[0].item_ids.len();
        let used = utf16_len(HEADER)
            + input[next - w[0].item_ids.len()..next]
                .iter()
                .map(|b| utf16_len(&b.text) + sep)
                .sum::<usize>();
        let following = utf16_len(&input[next].text) + sep;
        assert!(used + following > limit);
    }
}
