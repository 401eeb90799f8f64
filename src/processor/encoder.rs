use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

use crate::error::ImageError;
use crate::processor::resizer::ResizedImage;
use crate::processor::VariantKind;

pub struct EncodedVariant {
    pub variant: VariantKind,
    pub buff: Bytes,
}

/// Encodes every resized variant as JPEG on the rayon pool.
pub fn encode_variants(images: Vec<ResizedImage>) -> Result<Vec<EncodedVariant>, ImageError> {
    let (tx, rx) = crossbeam::channel::bounded(images.len());
    for resized in images {
        let local_tx = tx.clone();
        rayon::spawn(move || {
            let result = encode_jpeg(&resized.img).map(|buff| EncodedVariant {
                variant: resized.variant,
                buff,
            });
            local_tx
                .send(result)
                .expect("Failed to respond to encoding request. Receiver already closed.");
        });
    }

    // Needed to prevent deadlock.
    drop(tx);

    let mut finished = Vec::new();
    while let Ok(encoded) = rx.recv() {
        finished.push(encoded?);
    }

    Ok(finished)
}

#[inline]
pub fn encode_jpeg(img: &DynamicImage) -> Result<Bytes, ImageError> {
    // JPEG carries no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buff = Cursor::new(Vec::new());
    rgb.write_to(&mut buff, ImageFormat::Jpeg)?;
    Ok(Bytes::from(buff.into_inner()))
}
