//! Generates one medal image per username, sequentially and in input order.
//!
//! A failed or empty generation leaves an empty string in that slot; the
//! rest of the batch carries on.

use cv_core::ImageGenerator;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMedalsInput {
    pub top_usernames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMedalsOutput {
    /// `data:` URIs, aligned with the input usernames. Empty on failure.
    pub medal_images: Vec<String>,
}

pub async fn generate_medals(
    model: &dyn ImageGenerator,
    input: &GenerateMedalsInput,
) -> GenerateMedalsOutput {
    let mut medal_images = Vec::with_capacity(input.top_usernames.len());
    for username in &input.top_usernames {
        let image = match model.generate_image(&medal_prompt(username)).await {
            Ok(Some(media)) => media.to_data_uri(),
            Ok(None) => {
                warn!(%username, "image model returned no media");
                String::new()
            }
            Err(e) => {
                warn!(%username, error = %e, "medal generation failed");
                String::new()
            }
        };
        medal_images.push(image);
    }
    GenerateMedalsOutput { medal_images }
}

fn medal_prompt(username: &str) -> String {
    format!("Generate a gold medal image with the username \"{username}\" inscribed on it.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use cv_core::{GeneratedMedia, MockImageGenerator};
    use mockall::Sequence;

    fn png(tag: &'static [u8]) -> GeneratedMedia {
        GeneratedMedia {
            content_type: mime::IMAGE_PNG,
            data: Bytes::from_static(tag),
        }
    }

    #[tokio::test]
    async fn test_one_image_per_user_in_order() {
        let mut model = MockImageGenerator::new();
        let mut seq = Sequence::new();
        for (name, tag) in [("Asha", b"a" as &'static [u8]), ("Bilal", b"b" as &'static [u8])] {
            model
                .expect_generate_image()
                .withf(move |prompt| prompt.contains(&format!("\"{name}\"")))
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(Some(png(tag))));
        }

        let out = generate_medals(
            &model,
            &GenerateMedalsInput {
                top_usernames: vec!["Asha".into(), "Bilal".into()],
            },
        )
        .await;
        assert_eq!(out.medal_images, ["data:image/png;base64,YQ==", "data:image/png;base64,Yg=="]);
    }

    #[tokio::test]
    async fn test_failure_in_the_middle_leaves_placeholder() {
        let mut model = MockImageGenerator::new();
        model
            .expect_generate_image()
            .returning(|prompt| {
                if prompt.contains("Second") {
                    Err(anyhow::anyhow!("quota exhausted"))
                } else {
                    Ok(Some(png(b"ok")))
                }
            });

        let out = generate_medals(
            &model,
            &GenerateMedalsInput {
                top_usernames: vec!["First".into(), "Second".into(), "Third".into()],
            },
        )
        .await;
        assert_eq!(out.medal_images.len(), 3);
        assert!(!out.medal_images[0].is_empty());
        assert_eq!(out.medal_images[1], "");
        assert!(!out.medal_images[2].is_empty());
    }

    #[tokio::test]
    async fn test_empty_media_is_placeholder() {
        let mut model = MockImageGenerator::new();
        model.expect_generate_image().returning(|_| Ok(None));

        let out = generate_medals(
            &model,
            &GenerateMedalsInput {
                top_usernames: vec!["Solo".into()],
            },
        )
        .await;
        assert_eq!(out.medal_images, [""]);
    }
}
