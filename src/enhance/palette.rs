//! Category color resolution.
//!
//! Matching by name comes before trusting the model's color: it prevents
//! duplicate categories differing only by casing, and the session-scoped
//! [`ColorTracker`] keeps category color-coding visually distinct for as long
//! as the palette has headroom. The tracking is advisory only; concurrent
//! invocations may race and assign the same color, which is acceptable.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use super::normalize::{DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_NAME};
use super::types::{CategoryGuess, CategorySnapshot, EnhancedCategory};

/// Preset colors for newly introduced categories.
pub const DEFAULT_PALETTE: [&str; 15] = [
    "#3B82F6", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6",
    "#06B6D4", "#F97316", "#84CC16", "#EC4899", "#6B7280",
    "#14B8A6", "#F43F5E", "#8B5A2B", "#6366F1", "#D97706",
];

/// Session-scoped record of colors currently in use, threaded through the
/// orchestrator instance rather than kept as ambient global state.
#[derive(Debug, Default)]
pub struct ColorTracker {
    used: HashSet<String>,
}

impl ColorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a color as in use. Hex comparison is case-insensitive.
    pub fn observe(&mut self, color: &str) {
        self.used.insert(color.to_ascii_uppercase());
    }

    pub fn contains(&self, color: &str) -> bool {
        self.used.contains(&color.to_ascii_uppercase())
    }

    /// First palette entry not yet in use. When the whole palette is
    /// exhausted, pick 5 entries at random and use the first.
    pub fn pick_unused<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        DEFAULT_PALETTE
            .iter()
            .find(|color| !self.contains(color))
            .map(|color| color.to_string())
            .unwrap_or_else(|| {
                DEFAULT_PALETTE
                    .choose_multiple(rng, 5)
                    .next()
                    .unwrap_or(&DEFAULT_PALETTE[0])
                    .to_string()
            })
    }
}

/// Resolve the normalizer's category guess against existing categories.
///
/// A case-insensitive name match adopts the stored name and color exactly;
/// otherwise the category is new and gets a color that does not collide with
/// any color already in use (best effort).
pub fn resolve_category<R: Rng + ?Sized>(
    guess: &CategoryGuess,
    existing: &[CategorySnapshot],
    colors: &mut ColorTracker,
    rng: &mut R,
) -> EnhancedCategory {
    let trimmed = guess.name.trim().to_lowercase();
    let name = if trimmed.is_empty() {
        DEFAULT_CATEGORY_NAME.to_string()
    } else {
        trimmed
    };

    if let Some(category) = existing
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(&name))
    {
        // The stored color is authoritative, regardless of what the model proposed.
        return EnhancedCategory {
            name: category.name.clone(),
            color: category.color.clone(),
            is_new: false,
        };
    }

    let proposed = guess.color.trim();
    let color = if is_hex_color(proposed) && !colors.contains(proposed) {
        proposed.to_string()
    } else {
        colors.pick_unused(rng)
    };
    colors.observe(&color);

    EnhancedCategory {
        name,
        color,
        is_new: true,
    }
}

/// `#RRGGBB`.
fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn guess(name: &str, color: &str) -> CategoryGuess {
        CategoryGuess {
            name: name.to_string(),
            color: color.to_string(),
        }
    }

    fn snapshot(name: &str, color: &str) -> CategorySnapshot {
        CategorySnapshot {
            name: name.to_string(),
            color: color.to_string(),
            usage_frequency: 1,
        }
    }

    #[test]
    fn test_case_insensitive_match_adopts_stored_name_and_color() {
        let existing = vec![snapshot("work", "#112233")];
        let mut colors = ColorTracker::new();
        colors.observe("#112233");

        let resolved = resolve_category(&guess("Work", "#EF4444"), &existing, &mut colors, &mut rng());
        assert_eq!(resolved.name, "work");
        assert_eq!(resolved.color, "#112233");
        assert!(!resolved.is_new);
    }

    #[test]
    fn test_new_category_keeps_unused_proposed_color() {
        let mut colors = ColorTracker::new();
        let resolved = resolve_category(&guess("personal", "#10B981"), &[], &mut colors, &mut rng());
        assert_eq!(resolved.name, "personal");
        assert_eq!(resolved.color, "#10B981");
        assert!(resolved.is_new);
        assert!(colors.contains("#10B981"));
    }

    #[test]
    fn test_colliding_color_replaced_from_palette() {
        let mut colors = ColorTracker::new();
        colors.observe("#10B981");

        let resolved = resolve_category(&guess("errands", "#10B981"), &[], &mut colors, &mut rng());
        assert!(resolved.is_new);
        assert_ne!(resolved.color, "#10B981");
        assert!(DEFAULT_PALETTE.contains(&resolved.color.as_str()));
    }

    #[test]
    fn test_color_collision_detected_case_insensitively() {
        let mut colors = ColorTracker::new();
        colors.observe("#10b981");
        assert!(colors.contains("#10B981"));
    }

    #[test]
    fn test_invalid_color_replaced() {
        let mut colors = ColorTracker::new();
        let resolved = resolve_category(&guess("chores", "blue"), &[], &mut colors, &mut rng());
        assert!(DEFAULT_PALETTE.contains(&resolved.color.as_str()));
    }

    #[test]
    fn test_name_lowercased_and_trimmed() {
        let mut colors = ColorTracker::new();
        let resolved = resolve_category(&guess("  Deep Work  ", "#F97316"), &[], &mut colors, &mut rng());
        assert_eq!(resolved.name, "deep work");
    }

    #[test]
    fn test_empty_name_becomes_general() {
        let mut colors = ColorTracker::new();
        let resolved = resolve_category(&guess("  ", "#F97316"), &[], &mut colors, &mut rng());
        assert_eq!(resolved.name, "general");
    }

    #[test]
    fn test_no_reuse_until_palette_exhausted() {
        let mut colors = ColorTracker::new();
        let mut rng = rng();
        let mut assigned = Vec::new();

        for i in 0..DEFAULT_PALETTE.len() {
            let resolved = resolve_category(
                &guess(&format!("category-{}", i), "not-a-color"),
                &[],
                &mut colors,
                &mut rng,
            );
            assert!(
                !assigned.contains(&resolved.color),
                "color {} reused before palette exhaustion",
                resolved.color
            );
            assigned.push(resolved.color);
        }

        // 16th new category: palette exhausted, reuse is permitted.
        let resolved = resolve_category(&guess("overflow", "not-a-color"), &[], &mut colors, &mut rng);
        assert!(DEFAULT_PALETTE.contains(&resolved.color.as_str()));
    }
}
