//! Context-free promotional variants, used when there are no insights.

use rand::Rng;

use super::config::CreativeFormat;
use super::{Variant, variant_id_suffix};

/// Summary line reported alongside the fallback variants.
pub const FALLBACK_SUMMARY: &str = "Generated festive creative-only content";

/// Pre-authored copy: (format, headline, body).
const PROMOS: [(CreativeFormat, &str, &str); 3] = [
    (
        CreativeFormat::Image,
        "Christmas Mega Sale - Flat 50% OFF!",
        "Gifts, gadgets & festive must-haves! Limited time offer. Shop Now!",
    ),
    (
        CreativeFormat::VideoShort,
        "Unwrap Big Savings This Christmas",
        "Exclusive holiday deals are live - don't miss out!",
    ),
    (
        CreativeFormat::Carousel,
        "Festive Deals You Can't Resist",
        "Make your wishlist come true today!",
    ),
];

/// One variant per pre-authored promo, each with a fresh id.
pub fn promotional_variants<R: Rng + ?Sized>(rng: &mut R) -> Vec<Variant> {
    PROMOS
        .iter()
        .map(|(format, headline, body)| Variant {
            id: format!("creative_promo_{}", variant_id_suffix(rng)),
            target_segment: None,
            angle: None,
            format: *format,
            headline: (*headline).to_owned(),
            body: (*body).to_owned(),
            visual_direction: format.visual_direction().to_owned(),
            expected_metric: None,
            rationale: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fallback_is_format_diverse() {
        let variants = promotional_variants(&mut StdRng::seed_from_u64(1));
        let formats: Vec<CreativeFormat> = variants.iter().map(|v| v.format).collect();
        assert_eq!(
            formats,
            vec![
                CreativeFormat::Image,
                CreativeFormat::VideoShort,
                CreativeFormat::Carousel
            ]
        );
    }

    #[test]
    fn fallback_ids_are_distinct() {
        let variants = promotional_variants(&mut StdRng::seed_from_u64(7));
        assert_ne!(variants[0].id, variants[1].id);
        assert_ne!(variants[1].id, variants[2].id);
        assert!(variants.iter().all(|v| v.id.starts_with("creative_promo_")));
    }
}
