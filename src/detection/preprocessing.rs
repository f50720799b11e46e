use image::GrayImage;
use imageproc::edges::canny;

use crate::models::Frame;

/// Convert frame to grayscale
pub fn to_grayscale(frame: &Frame) -> GrayImage {
    image::imageops::grayscale(frame)
}

/// Edge-preserving smoothing: flat regions are averaged, strong edges survive
pub fn bilateral_filter(img: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    imageproc::filter::bilateral_filter(img, diameter, sigma_color, sigma_space)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}
