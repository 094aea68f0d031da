mod common;

use common::{
    assert_matches_reference, person_like, person_like_bgr, regression_path, BrightnessModel,
    ConstantModel,
};
use human_segmentation::segmentation::{ChannelOrder, Image, MaskRefiner, RefinerConfig};
use image::{imageops::FilterType, Rgb, RgbImage};

#[test]
fn mask_matches_input_dimensions() {
    let mut refiner = MaskRefiner::new(BrightnessModel);

    for (width, height) in [(64, 64), (720, 480), (1920, 1080), (1, 1), (3, 500)] {
        let image = person_like_bgr(width, height);
        let mask = refiner.refine(&image).unwrap();
        assert_eq!(mask.dimensions(), (width, height), "{width}x{height}");
        assert!(mask.as_image().pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
    }
}

#[test]
fn repeated_refinement_is_byte_identical() {
    let mut refiner = MaskRefiner::new(BrightnessModel);
    let image = person_like_bgr(320, 240);

    let first = refiner.refine(&image).unwrap();
    let second = refiner.refine(&image).unwrap();
    assert_eq!(first.as_image().as_raw(), second.as_image().as_raw());
}

#[test]
fn confident_foreground_inverts_to_zero() {
    let mut refiner = MaskRefiner::new(ConstantModel {
        foreground: 0.97,
        background: 0.02,
    });
    let image = person_like_bgr(100, 80);

    let refinement = refiner.refine_with_planes(&image).unwrap();
    assert!(refinement.foreground_inverted.pixels().all(|p| p[0] == 0));
    assert!(refinement.background_inverted.pixels().all(|p| p[0] == 255));
}

#[test]
fn person_region_is_marked_in_mask() {
    let mut refiner = MaskRefiner::new(BrightnessModel);
    let image = person_like_bgr(640, 360);

    let mask = refiner.refine(&image).unwrap();
    // centre of the ellipse vs. a corner
    assert_eq!(mask.value(320, 200), 255);
    assert_eq!(mask.value(5, 5), 0);
}

#[test]
fn channel_order_is_honoured() {
    // Same samples, read as RGB: the bright channel is no longer first for a BGR model
    let mut refiner = MaskRefiner::new(BrightnessModel);
    let buffer = RgbImage::from_pixel(256, 144, Rgb([230, 10, 10]));

    let as_bgr = refiner.refine(&Image::bgr(buffer.clone())).unwrap();
    let as_rgb = refiner.refine(&Image::rgb(buffer)).unwrap();

    assert_eq!(as_bgr.value(100, 100), 255);
    assert_eq!(as_rgb.value(100, 100), 0);
}

#[test]
fn rgb_model_order_can_be_configured() {
    let config = RefinerConfig {
        model_channel_order: ChannelOrder::Rgb,
        resize_filter: FilterType::Triangle,
        ..RefinerConfig::default()
    };
    let mut refiner = MaskRefiner::with_config(BrightnessModel, config);

    let mask = refiner.refine(&Image::rgb(person_like(400, 300))).unwrap();
    assert_eq!(mask.dimensions(), (400, 300));
    assert_eq!(mask.value(200, 165), 255);
}

#[test]
fn brightness_mask_matches_stored_reference() {
    let mut refiner = MaskRefiner::new(BrightnessModel);
    let mask = refiner.refine(&person_like_bgr(640, 360)).unwrap();

    assert_matches_reference(
        &mask,
        &regression_path("brightness_person_like_640x360_mask.png"),
    );
}
