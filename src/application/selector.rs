use crate::domain::{AppError, Resolution, StreamVariant};

#[derive(Debug, Clone)]
pub struct Selection {
    pub variant: StreamVariant,
    /// Set when the requested resolution was unavailable.
    pub fallback_from: Option<Resolution>,
}

impl Selection {
    pub fn is_fallback(&self) -> bool {
        self.fallback_from.is_some()
    }
}

/// Exact resolution match first, otherwise the highest variant flagged as a fallback.
pub fn select(variants: &[StreamVariant], requested: Resolution) -> Result<Selection, AppError> {
    if let Some(exact) = variants.iter().find(|v| v.resolution == requested) {
        return Ok(Selection {
            variant: exact.clone(),
            fallback_from: None,
        });
    }

    // `max_by_key` keeps the last maximum; reversing makes the first listed win ties.
    variants
        .iter()
        .rev()
        .max_by_key(|v| v.resolution)
        .map(|highest| Selection {
            variant: highest.clone(),
            fallback_from: Some(requested),
        })
        .ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ByteSource, ByteStream};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoBytes;

    #[async_trait]
    impl ByteSource for NoBytes {
        async fn open(&self) -> Result<ByteStream, AppError> {
            unimplemented!("not needed for selection tests")
        }
    }

    fn variant(resolution: Resolution, extension: &str) -> StreamVariant {
        StreamVariant {
            resolution,
            extension: extension.to_string(),
            source: Arc::new(NoBytes),
        }
    }

    fn variants(resolutions: &[Resolution]) -> Vec<StreamVariant> {
        resolutions.iter().map(|r| variant(*r, "mp4")).collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let available = variants(&[Resolution::P480, Resolution::P720]);
        let selection = select(&available, Resolution::P720).unwrap();
        assert_eq!(selection.variant.resolution, Resolution::P720);
        assert!(!selection.is_fallback());
    }

    #[test]
    fn test_fallback_to_highest() {
        let available = variants(&[Resolution::P144, Resolution::P360]);
        let selection = select(&available, Resolution::P1080).unwrap();
        assert_eq!(selection.variant.resolution, Resolution::P360);
        assert_eq!(selection.fallback_from, Some(Resolution::P1080));
    }

    #[test]
    fn test_fallback_can_pick_higher_than_requested() {
        let available = variants(&[Resolution::P1080, Resolution::P240]);
        let selection = select(&available, Resolution::P480).unwrap();
        assert_eq!(selection.variant.resolution, Resolution::P1080);
        assert!(selection.is_fallback());
    }

    #[test]
    fn test_empty_is_not_found() {
        let result = select(&[], Resolution::P720);
        assert_eq!(result.unwrap_err(), AppError::NotFound);
    }

    #[test]
    fn test_ties_prefer_first_listed() {
        let available = vec![
            variant(Resolution::P720, "mp4"),
            variant(Resolution::P720, "webm"),
        ];
        let exact = select(&available, Resolution::P720).unwrap();
        assert_eq!(exact.variant.extension, "mp4");

        let fallback = select(&available, Resolution::P1080).unwrap();
        assert_eq!(fallback.variant.extension, "mp4");
    }

    #[test]
    fn test_every_requested_resolution() {
        let subsets: [&[Resolution]; 4] = [
            &[Resolution::P144],
            &[Resolution::P240, Resolution::P1080],
            &[Resolution::P360, Resolution::P480, Resolution::P720],
            &Resolution::ALL,
        ];

        for subset in subsets {
            let available = variants(subset);
            let highest = subset.iter().max().copied().unwrap();
            for requested in Resolution::ALL {
                let selection = select(&available, requested).unwrap();
                if subset.contains(&requested) {
                    assert_eq!(selection.variant.resolution, requested);
                    assert!(!selection.is_fallback());
                } else {
                    assert_eq!(selection.variant.resolution, highest);
                    assert_eq!(selection.fallback_from, Some(requested));
                }
            }
        }
    }
}
