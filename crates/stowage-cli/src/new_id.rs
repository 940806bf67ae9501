//! Asset id generation command.

use anyhow::Result;
use stowage_core::AssetId;

/// Generate `count` fresh ids.
pub fn generate(count: usize) -> Vec<AssetId> {
    (0..count).map(|_| AssetId::generate()).collect()
}

/// Run the new-id command.
pub fn run(count: usize) -> Result<()> {
    if count == 0 {
        anyhow::bail!("count must be at least 1");
    }
    for id in generate(count) {
        println!("{id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generate___returns_distinct_ids() {
        let ids = generate(16);

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 16);
        assert!(ids.iter().all(|id| !id.is_nil()));
    }

    #[test]
    fn run___zero_count___fails() {
        assert!(run(0).is_err());
    }
}
