use anyhow::{Context, Result, bail};
use std::collections::HashSet;

/// Largest range a single token may expand to.
const MAX_RANGE_LEN: u64 = 100_000;

/// Resolve CLI seed tokens into a deduplicated, order-preserving list.
///
/// Supports literal integers (negative values use their magnitude), half-open
/// ranges `a..b` and inclusive ranges `a..=b`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        for seed in expand_token(token)? {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(1337);
    }

    Ok(seeds)
}

fn expand_token(token: &str) -> Result<Vec<u64>> {
    if let Some((start, end)) = token.split_once("..") {
        let start = parse_bound(start, token)?;
        let (end, inclusive) = match end.strip_prefix('=') {
            Some(end) => (parse_bound(end, token)?, true),
            None => (parse_bound(end, token)?, false),
        };
        let end = if inclusive {
            end.checked_add(1)
                .with_context(|| format!("seed range {token} overflows"))?
        } else {
            end
        };
        if start >= end {
            bail!("Empty seed range: {token}");
        }
        if end - start > MAX_RANGE_LEN {
            bail!("Seed range {token} exceeds {MAX_RANGE_LEN} seeds");
        }
        return Ok((start..end).collect());
    }

    if let Ok(value) = token.parse::<i64>() {
        return Ok(vec![value.unsigned_abs()]);
    }

    if let Ok(value) = token.parse::<u64>() {
        return Ok(vec![value]);
    }

    bail!("Unrecognized seed token: {token}");
}

fn parse_bound(raw: &str, token: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("invalid bound '{raw}' in seed range {token}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_literals_and_ranges() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "3..6", "10..=11"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 3, 4, 5, 10, 11]);
    }

    #[test]
    fn deduplicates_in_first_seen_order() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "4..7", "5"])).unwrap();
        assert_eq!(seeds, vec![5, 4, 6]);
    }

    #[test]
    fn empty_input_falls_back_to_default_seed() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![1337]);
        assert_eq!(resolve_seed_inputs(&tokens(&[" "])).unwrap(), vec![1337]);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9..3"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["1..x"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..1000000"])).is_err());
    }
}
