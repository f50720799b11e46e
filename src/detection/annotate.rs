use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::models::{AccessStatus, BoundingBox, Frame};

const ALLOW_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const DENY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_THICKNESS: u32 = 2;

/// Draw the plate box on a copy of `frame`, green for ALLOW and red for DENY.
pub fn annotate(frame: &Frame, bbox: &BoundingBox, status: AccessStatus) -> Frame {
    let color = match status {
        AccessStatus::Allow => ALLOW_COLOR,
        AccessStatus::Deny => DENY_COLOR,
    };
    let mut annotated = frame.clone();
    draw_plate_box(&mut annotated, bbox, color);
    annotated
}

fn draw_plate_box(frame: &mut Frame, bbox: &BoundingBox, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let width = bbox.width.saturating_sub(2 * inset);
        let height = bbox.height.saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32).of_size(width, height);
        draw_hollow_rect_mut(frame, rect, color);
    }
}
