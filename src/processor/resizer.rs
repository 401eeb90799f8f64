use std::sync::Arc;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::VariantPresets;
use crate::error::ImageError;
use crate::processor::VariantKind;

pub struct ResizedImage {
    pub variant: VariantKind,
    pub img: DynamicImage,
}

/// Decodes the uploaded bytes and produces one image per variant,
/// resizing on the rayon pool. The original is passed through
/// untouched.
pub fn resize_to_variants(
    presets: VariantPresets,
    data: &[u8],
) -> Result<Vec<ResizedImage>, ImageError> {
    let original = Arc::new(image::load_from_memory(data)?);

    let sized = [
        (VariantKind::Thumbnail, presets.thumbnail),
        (VariantKind::Medium, presets.medium),
    ];

    let (tx, rx) = crossbeam::channel::bounded(sized.len());
    for (variant, cfg) in sized {
        let local_tx = tx.clone();
        let local = original.clone();
        rayon::spawn(move || {
            let img = local.resize(cfg.width, cfg.height, FilterType::Triangle);
            local_tx
                .send(ResizedImage { variant, img })
                .expect("Failed to respond to resize request. Receiver already closed.");
        });
    }

    // Needed to prevent deadlock.
    drop(tx);

    let mut finished = vec![ResizedImage {
        variant: VariantKind::Original,
        img: original.as_ref().clone(),
    }];
    while let Ok(resized) = rx.recv() {
        finished.push(resized);
    }

    Ok(finished)
}
