//! Apply compiled filters to a catalog snapshot.

use crate::filter::FilterPredicate;
use crate::image::ImageRecord;

/// Keep every image for which all predicates hold, preserving input order.
/// An empty predicate list keeps everything.
pub fn apply_ref<'a>(
    images: &'a [ImageRecord],
    predicates: &'a [FilterPredicate],
) -> impl Iterator<Item = &'a ImageRecord> + 'a {
    images
        .iter()
        .filter(move |image| predicates.iter().all(|p| p.matches(image)))
}

/// Owned variant of [`apply_ref`].
pub fn apply(images: Vec<ImageRecord>, predicates: &[FilterPredicate]) -> Vec<ImageRecord> {
    if predicates.is_empty() {
        return images;
    }
    images
        .into_iter()
        .filter(|image| predicates.iter().all(|p| p.matches(image)))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::testutils::{record, sample_catalog, t0};

    fn ids<'a>(images: impl IntoIterator<Item = &'a ImageRecord>) -> Vec<&'a str> {
        images.into_iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_empty_predicates_keep_all() {
        let catalog = sample_catalog();
        assert_eq!(apply(catalog.clone(), &[]), catalog);
        assert_eq!(ids(apply_ref(&catalog, &[])), ["a1", "a2"]);
    }

    #[test]
    fn test_conjunction_preserves_order() {
        let catalog = vec![
            record("c", &["one:1"], t0()),
            record("b", &[], t0() - Duration::hours(3)),
            record("a", &[], t0() - Duration::hours(1)),
            record("d", &[], t0() + Duration::hours(1)),
        ];
        let preds = [
            FilterPredicate::Dangling,
            FilterPredicate::Before(t0() + Duration::minutes(1)),
        ];
        // Exactly the subset where every predicate holds, in catalog order
        assert_eq!(ids(apply_ref(&catalog, &preds)), ["b", "a"]);
        let expected: Vec<_> = catalog
            .iter()
            .filter(|i| preds.iter().all(|p| p.matches(i)))
            .cloned()
            .collect();
        assert_eq!(apply(catalog, &preds), expected);
    }

    #[test]
    fn test_no_match() {
        let catalog = sample_catalog();
        let preds = [FilterPredicate::FreeText("nonexistent".into())];
        assert!(apply(catalog, &preds).is_empty());
    }
}
