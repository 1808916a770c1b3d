mod common;

use common::*;
use image::{Rgb, RgbImage};
use lopdf::{Dictionary, Object, Stream};
use pdf_bleed::*;

fn page_with_offset(dx: f64, dy: f64) -> SourcePage {
    let (x0, y0) = (100.0, 50.0);
    SourcePage {
        index: 0,
        id: (1, 0),
        media_box: PageBox::new(x0, y0, 612.0, 792.0),
        crop_box: None,
        trim_box: Some(PageBox::new(x0 + dx, y0 + dy, 500.0, 700.0)),
        rotation: Rotation::None,
    }
}

#[test]
fn test_embedded_content_offset_law() {
    let options = BleedOptions::default();
    for (dx, dy) in [(0.0, 0.0), (12.0, 20.0), (36.5, 3.25)] {
        let page = page_with_offset(dx, dy);
        let trim = resolve_trim(&page).unwrap();
        let layout = compose_page(&page, &trim, Vec::new(), &options);

        let (ox, oy) = layout.content_origin();
        assert!((ox - (27.0 - dx)).abs() < 1e-9);
        assert!((oy - (27.0 - dy)).abs() < 1e-9);
        assert_eq!(&layout.content_matrix[..4], &[1.0, 0.0, 0.0, 1.0]);
    }
}

#[test]
fn test_crop_marks_stay_in_the_margin_band() {
    let options = BleedOptions::default();
    let page = page_with_offset(12.0, 20.0);
    let trim = resolve_trim(&page).unwrap();
    let layout = compose_page(&page, &trim, Vec::new(), &options);

    let margin = options.crop_margin_pt();
    let trim_lines_x = [layout.trim_box.x, layout.trim_box.right()];
    let trim_lines_y = [layout.trim_box.y, layout.trim_box.top()];

    for segment in &layout.marks.segments {
        let (sx, sy) = segment.start;
        let (ex, ey) = segment.end;
        if sy == ey {
            // Horizontal: collinear with a trim edge, inside a side margin
            assert!(trim_lines_y.contains(&sy));
            let (lo, hi) = (sx.min(ex), sx.max(ex));
            assert!(hi <= margin + 1e-9 || lo >= layout.width - margin - 1e-9);
        } else {
            assert_eq!(sx, ex);
            assert!(trim_lines_x.contains(&sx));
            let (lo, hi) = (sy.min(ey), sy.max(ey));
            assert!(hi <= margin + 1e-9 || lo >= layout.height - margin - 1e-9);
        }
        // Never reaches the bleed box
        let bleed = layout.bleed_box;
        for (x, y) in [segment.start, segment.end] {
            let inside = x > bleed.x && x < bleed.right() && y > bleed.y && y < bleed.top();
            assert!(!inside, "mark point ({}, {}) inside the bleed box", x, y);
        }
    }
}

#[test]
fn test_strips_tile_the_bleed_band() {
    let input = letter_pdf(1);
    let source = SourceDocument::load(&input).unwrap();
    let page = source.page(0).unwrap();
    let trim = resolve_trim(&page).unwrap();
    let options = BleedOptions::default();

    let frame = RasterFrame::blank(2550, 3300, options.dpi);
    let mirrored = mirror_frame(frame, options.bleed_px(), options.overlap_policy, 0).unwrap();
    let strips = extract_strips(&mirrored, &trim, &options).unwrap();
    let layout = compose_page(&page, &trim, strips, &options);

    let band_area = layout.bleed_box.width * layout.bleed_box.height
        - layout.trim_box.width * layout.trim_box.height;
    let strip_area: f64 = layout
        .strips
        .iter()
        .map(|s| s.placement.width * s.placement.height)
        .sum();
    assert!((band_area - strip_area).abs() < 1e-6);

    // Drawn at the fixed pixel-to-point ratio
    let points_per_px = 72.0 / options.dpi as f64;
    for strip in &layout.strips {
        assert!((strip.placement.height - strip.height_px as f64 * points_per_px).abs() < 0.25);
        assert!((strip.placement.width - strip.width_px as f64 * points_per_px).abs() < 0.25);
    }
}

#[test]
fn test_strip_pixels_survive_encoding() {
    let options = BleedOptions::default();
    let trim = resolve_trim(&SourceDocument::load(&letter_pdf(1)).unwrap().page(0).unwrap())
        .unwrap();
    let frame = RasterFrame::from_pixels(
        RgbImage::from_fn(2550, 3300, |x, y| Rgb(pattern_pixel(0, x, y))),
        options.dpi,
    );
    let mirrored = mirror_frame(frame, 38, OverlapPolicy::Allow, 0).unwrap();
    let strips = extract_strips(&mirrored, &trim, &options).unwrap();

    let sides: Vec<StripSide> = strips.iter().map(|s| s.side).collect();
    assert_eq!(sides, StripSide::ALL.to_vec());

    for strip in &strips {
        let decoded = strip.decode().unwrap();
        let (x, y, w, h) = strip_source_rect(&mirrored, strip.side);
        assert_eq!(decoded.dimensions(), (w, h));
        for (px, py, pixel) in decoded.enumerate_pixels() {
            assert_eq!(pixel, mirrored.pixels().get_pixel(x + px, y + py));
        }
    }
}

#[test]
fn test_mirrored_corners_reflect_markers() {
    let (w, h, b) = (40, 30, 4);
    let mut pixels = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
    // Distinct marker one pixel in from each corner
    pixels.put_pixel(1, 0, Rgb([255, 0, 0]));
    pixels.put_pixel(w - 2, 0, Rgb([0, 255, 0]));
    pixels.put_pixel(1, h - 1, Rgb([0, 0, 255]));
    pixels.put_pixel(w - 2, h - 1, Rgb([0, 0, 0]));

    let mirrored = mirror_frame(RasterFrame::from_pixels(pixels, 300), b, OverlapPolicy::Allow, 0)
        .unwrap();
    let out = mirrored.pixels();
    let (mw, mh) = (w + 2 * b, h + 2 * b);

    // Source (1, 0) reflects to (b - 2, b - 1) in the top-left corner block
    assert_eq!(out.get_pixel(b - 2, b - 1), &Rgb([255, 0, 0]));
    assert_eq!(out.get_pixel(mw - b + 1, b - 1), &Rgb([0, 255, 0]));
    assert_eq!(out.get_pixel(b - 2, mh - b), &Rgb([0, 0, 255]));
    assert_eq!(out.get_pixel(mw - b + 1, mh - b), &Rgb([0, 0, 0]));
    // Centre untouched
    assert_eq!(out.get_pixel(b + 1, b), &Rgb([255, 0, 0]));
}

#[test]
fn test_written_page_resources() {
    let input = letter_pdf(1);
    let output = generate_bleed_sync(&input, &SyntheticBackend::pattern(), &BleedOptions::default())
        .unwrap();
    let doc = load_output(&output);
    let page = doc.get_dictionary(page_ids(&doc)[0]).unwrap();

    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    for name in ["BleedTop", "BleedBottom", "BleedLeft", "BleedRight", SOURCE_PAGE_XOBJECT] {
        assert!(xobjects.has(name.as_bytes()), "missing {}", name);
    }

    let form_id = xobjects.get(b"SrcPage").unwrap().as_reference().unwrap();
    let form = doc.get_object(form_id).unwrap().as_stream().unwrap();
    assert_eq!(form.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");
    assert!(form.dict.has(b"Resources"));

    let states = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
    let overprint = states.get(OVERPRINT_GS_NAME.as_bytes()).unwrap().as_dict().unwrap();
    assert_eq!(overprint.get(b"OP").unwrap(), &Object::Boolean(true));
    assert_eq!(overprint.get(b"OPM").unwrap(), &Object::Integer(1));

    let strip_id = xobjects.get(b"BleedLeft").unwrap().as_reference().unwrap();
    let strip = doc.get_object(strip_id).unwrap().as_stream().unwrap();
    assert_eq!(
        strip.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
        b"DeviceRGB"
    );
    assert_eq!(
        strip.dict.get(b"Filter").unwrap().as_name().unwrap(),
        b"FlateDecode"
    );
}

fn hex_stream(content: &[u8]) -> Stream {
    Stream::new(
        Dictionary::from_iter(vec![("Filter", Object::Name(b"ASCIIHexDecode".to_vec()))]),
        ascii_hex(content),
    )
}

#[test]
fn test_undecodable_single_stream_keeps_its_filter() {
    let drawing = b"q 0 0 1 rg 10 10 200 200 re f Q";
    let input = letter_pdf_with_contents(|doc| Object::Reference(doc.add_object(hex_stream(drawing))));

    let output = generate_bleed_sync(&input, &SyntheticBackend::pattern(), &BleedOptions::default())
        .unwrap();
    let doc = load_output(&output);
    let form = source_form(&doc, 0);

    assert_eq!(
        form.dict.get(b"Filter").unwrap().as_name().unwrap(),
        b"ASCIIHexDecode"
    );
    assert_eq!(form.content, ascii_hex(drawing));
}

#[test]
fn test_undecodable_stream_among_several_fails() {
    let input = letter_pdf_with_contents(|doc| {
        let plain = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let hex = doc.add_object(hex_stream(b"0 0 m 10 10 l S"));
        Object::Array(vec![Object::Reference(plain), Object::Reference(hex)])
    });

    let result = generate_bleed_sync(&input, &SyntheticBackend::pattern(), &BleedOptions::default());

    assert!(matches!(result, Err(BleedError::Composition(_))));
}

#[test]
fn test_dangling_contents_reference_fails() {
    let input = letter_pdf_with_contents(|doc| Object::Reference((doc.max_id + 50, 0)));

    let result = generate_bleed_sync(&input, &SyntheticBackend::pattern(), &BleedOptions::default());

    assert!(matches!(result, Err(BleedError::Composition(_))));
}

#[test]
fn test_unfiltered_and_flate_streams_are_joined() {
    let input = letter_pdf_with_contents(|doc| {
        let plain = doc.add_object(Stream::new(Dictionary::new(), b"q 1 0 0 rg".to_vec()));
        let mut packed = Stream::new(Dictionary::new(), b"0 0 5 5 re f Q".to_vec());
        packed.compress().unwrap();
        let packed = doc.add_object(packed);
        Object::Array(vec![Object::Reference(plain), Object::Reference(packed)])
    });

    let output = generate_bleed_sync(&input, &SyntheticBackend::pattern(), &BleedOptions::default())
        .unwrap();
    let doc = load_output(&output);
    let form = source_form(&doc, 0);

    assert_eq!(
        form.decompressed_content().unwrap_or_else(|_| form.content.clone()),
        b"q 1 0 0 rg\n0 0 5 5 re f Q".to_vec()
    );
}
