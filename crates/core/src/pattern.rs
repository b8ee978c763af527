//! Single-pass `*` glob matching
//!
//! A pattern is literal text except for `*`, which stands for any run of
//! characters. Blocks between stars are matched left to right at the first
//! position where they fit, with no backtracking. This keeps matching linear
//! but means a later, better placement of a block is never tried: `*.txt`
//! does not match `a.txt.txt`.

/// Check whether `text` matches `pattern`
///
/// Matching is case-sensitive and compares characters exactly. A pattern
/// without `*` matches only identical text. Never fails; a malformed pattern
/// simply doesn't match.
pub fn matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let mut p = 0usize; // position in pattern
    let mut t = 0usize; // position in text
    let mut in_star = false;

    while p < pattern.len() && t < text.len() {
        if pattern[p] == '*' {
            // Consecutive stars collapse into one
            in_star = true;
            p += 1;
            continue;
        }

        if pattern[p] != text[t] {
            if !in_star {
                break;
            }
            t += 1;
            continue;
        }

        if !in_star {
            p += 1;
            t += 1;
            continue;
        }

        // Inside a star: try to place the whole literal block here
        let block_end = pattern[p..]
            .iter()
            .position(|&c| c == '*')
            .map_or(pattern.len(), |offset| p + offset);
        let block = &pattern[p..block_end];

        if block.len() > text.len() - t {
            // Not enough text left for this block
            break;
        }

        if text[t..t + block.len()] == *block {
            in_star = false;
            p += block.len();
            t += block.len();
        } else {
            t += 1;
        }
    }

    // A pattern containing a star may leave one unconsumed character (its
    // trailing star). Remaining text is only allowed while inside a star.
    let slack = usize::from(pattern.contains(&'*'));
    let pattern_done = p + slack >= pattern.len();
    let text_done = in_star || t >= text.len();

    pattern_done && text_done
}
