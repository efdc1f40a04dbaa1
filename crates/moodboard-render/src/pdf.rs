//! Single-page PDF wrapping a raster snapshot.

use image::RgbaImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page orientation and media box for an image of `width`×`height` pixels.
///
/// One pixel maps to one point; square images count as landscape.
pub fn page_for(width: u32, height: u32) -> (Orientation, Rect) {
    let orientation = if width >= height {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };
    (orientation, Rect::new(0.0, 0.0, width as f32, height as f32))
}

/// Composite onto white and drop alpha.
pub(crate) fn flatten_rgb(image: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let over_white = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        rgb.extend_from_slice(&[over_white(r), over_white(g), over_white(b)]);
    }
    rgb
}

/// Encode `image` as a one-page PDF with the image filling the page.
pub fn encode_pdf(image: &RgbaImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let (orientation, media_box) = page_for(width, height);
    log::debug!("PDF page {}x{} ({:?})", width, height, orientation);

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let content_id = Ref::new(5);
    let image_name = Name(b"Im1");

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(media_box);
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(image_name, image_id);
    page.finish();

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&flatten_rgb(image), 6);
    let mut xobject = pdf.image_xobject(image_id, &compressed);
    xobject.filter(Filter::FlateDecode);
    xobject.width(width as i32);
    xobject.height(height as i32);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    xobject.finish();

    let mut content = Content::new();
    content.save_state();
    content.transform([width as f32, 0.0, 0.0, height as f32, 0.0, 0.0]);
    content.x_object(image_name);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    pdf.finish()
}
