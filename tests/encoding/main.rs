use std::collections::HashSet;

use base64::Engine;
use indexed_png::{inspect, IndexedPng, Pixel, MAX_STORED_BLOCK, SIGNATURE};

/// Splits a finished file into `(type, payload, stored crc, crc input)` per chunk.
fn chunks(bytes: &[u8]) -> Vec<([u8; 4], &[u8], u32, &[u8])> {
    assert_eq!(&bytes[..8], &SIGNATURE);
    let mut chunks = Vec::new();
    let mut offset = 8;
    while offset < bytes.len() {
        let len = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
        let chunk_type: [u8; 4] = bytes[offset + 4..offset + 8].try_into().unwrap();
        let payload = &bytes[offset + 8..offset + 8 + len];
        let crc_at = offset + 8 + len;
        let crc = u32::from_be_bytes(bytes[crc_at..crc_at + 4].try_into().unwrap());
        chunks.push((chunk_type, payload, crc, &bytes[offset + 4..crc_at]));
        offset = crc_at + 4;
    }
    chunks
}

/// Bit-at-a-time CRC-32, independent of the table-driven one in the crate.
fn bitwise_crc(data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xedb8_8320 & mask);
        }
    }
    !crc
}

fn naive_adler(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + byte as u32) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

fn idat_payload(bytes: &[u8]) -> Vec<u8> {
    chunks(bytes)
        .into_iter()
        .filter(|(chunk_type, ..)| chunk_type == b"IDAT")
        .flat_map(|(_, payload, ..)| payload.to_vec())
        .collect()
}

fn checkerboard() -> IndexedPng {
    let mut png = IndexedPng::new(2, 2, 4).unwrap();
    let black = png.register_color(0, 0, 0, 255);
    let white = png.register_color(255, 255, 255, 255);
    assert_eq!((black, white), (0, 1));
    png.write_pixel(0, 0, black);
    png.write_pixel(1, 1, black);
    png.write_pixel(1, 0, white);
    png.write_pixel(0, 1, white);
    png
}

/// Three colors in diagonal bands, the third half transparent.
fn banded(width: u32, height: u32) -> IndexedPng {
    let mut png = IndexedPng::new(width, height, 3).unwrap();
    let slots = [
        png.register_opaque(200, 30, 30),
        png.register_opaque(30, 200, 30),
        png.register_color(30, 30, 200, 128),
    ];
    png.fill(|x, y| slots[((x + 2 * y) % 3) as usize]);
    png
}

#[test]
fn checkerboard_base64() {
    insta::assert_snapshot!(checkerboard().to_base64(), @"iVBORw0KGgoAAAANSUhEUgAAAAIAAAACCAMAAABFaP0WAAAADFBMVEUAAAD///8AAAAAAADI23cLAAAABHRSTlP//wAA0w5UhgAAABFJREFUeNoBBgD5/wAAAQABAAAMAAOGxGwWAAAAAElFTkSuQmCC");
}

#[test]
fn checkerboard_decodes_to_exact_rgba() {
    let bytes = checkerboard().finalize();
    let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .unwrap()
        .to_rgba8();
    assert_eq!(image.dimensions(), (2, 2));
    let black = image::Rgba([0, 0, 0, 255]);
    let white = image::Rgba([255, 255, 255, 255]);
    assert_eq!(*image.get_pixel(0, 0), black);
    assert_eq!(*image.get_pixel(1, 1), black);
    assert_eq!(*image.get_pixel(1, 0), white);
    assert_eq!(*image.get_pixel(0, 1), white);
}

#[test]
fn multi_block_image_decodes() {
    let (width, height) = (300, 300);
    let bytes = banded(width, height).finalize();
    let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .unwrap()
        .to_rgba8();
    let colors = [
        image::Rgba([200, 30, 30, 255]),
        image::Rgba([30, 200, 30, 255]),
        image::Rgba([30, 30, 200, 128]),
    ];
    for (x, y, pixel) in image.enumerate_pixels() {
        assert_eq!(*pixel, colors[((x + 2 * y) % 3) as usize], "at ({x}, {y})");
    }
    assert_eq!(inspect::verify(&bytes).unwrap().stored_blocks, 2);
}

#[test]
fn layout_of_checkerboard() {
    let png = checkerboard();
    insta::assert_debug_snapshot!(png.layout(), @r###"
    Layout {
        width: 2,
        height: 2,
        palette_capacity: 4,
        pixel_bytes: 6,
        stored_blocks: 1,
        ihdr: Region {
            offset: 0,
            size: 25,
        },
        plte: Region {
            offset: 25,
            size: 24,
        },
        trns: Region {
            offset: 49,
            size: 16,
        },
        idat: Region {
            offset: 65,
            size: 29,
        },
        iend: Region {
            offset: 94,
            size: 12,
        },
    }
    "###);
}

#[test]
fn stored_blocks_of_multi_block_image() {
    let png = IndexedPng::new(300, 300, 64).unwrap();
    let blocks: Vec<_> = png.layout().blocks().collect();
    insta::assert_debug_snapshot!(blocks, @r###"
    [
        StoredBlock {
            header: 315,
            data: 320..65855,
            is_final: false,
        },
        StoredBlock {
            header: 65855,
            data: 65860..90625,
            is_final: true,
        },
    ]
    "###);
}

#[test]
fn chunk_crcs_match_independent_recomputation() {
    let configs = [
        (1, 1, 1),
        (2, 2, 4),
        (17, 5, 256),
        (65534, 1, 2),
        (65535, 1, 2),
        (1, 65535, 7),
        (300, 300, 3),
    ];
    for (width, height, capacity) in configs {
        let mut png = IndexedPng::new(width, height, capacity).unwrap();
        for i in 0..capacity.min(10) {
            png.register_color(i as u8, 2 * i as u8, 3 * i as u8, 255 - i as u8);
        }
        png.fill(|x, y| ((x ^ y) % capacity as u32) as u8);
        let bytes = png.finalize();
        let chunks = chunks(&bytes);
        let types: Vec<_> = chunks.iter().map(|(chunk_type, ..)| *chunk_type).collect();
        assert_eq!(types, [*b"IHDR", *b"PLTE", *b"tRNS", *b"IDAT", *b"IEND"]);
        for (chunk_type, _, crc, covered) in &chunks {
            assert_eq!(
                *crc,
                bitwise_crc(covered),
                "{} crc for {width}x{height}/{capacity}",
                String::from_utf8_lossy(chunk_type)
            );
        }
        let (_, ihdr, ..) = chunks[0];
        assert_eq!(ihdr[8], 8, "bit depth");
        assert_eq!(ihdr[9], 3, "color type");
        assert_eq!(chunks[1].1.len(), 3 * capacity as usize);
        assert_eq!(chunks[2].1.len(), capacity as usize);
        assert!(chunks[4].1.is_empty());
    }
}

#[test]
fn adler_matches_inflated_rows() {
    for (width, height) in [(2, 2), (65535, 1), (1000, 200)] {
        let mut png = banded(width, height);
        let bytes = png.finalize();
        let stream = idat_payload(&bytes);
        let rows = miniz_oxide::inflate::decompress_to_vec_zlib(&stream).unwrap();

        let mut expected = Vec::new();
        for y in 0..height {
            expected.push(0);
            expected.extend((0..width).map(|x| png.pixel(x, y)));
        }
        assert_eq!(rows, expected);

        let trailer = u32::from_be_bytes(stream[stream.len() - 4..].try_into().unwrap());
        assert_eq!(trailer, naive_adler(&rows));
    }
}

#[test]
fn pixel_offsets_never_alias() {
    // 160400 filter and index bytes, spread over three stored blocks.
    let png = IndexedPng::new(400, 400, 1).unwrap();
    let layout = png.layout().clone();
    assert_eq!(layout.stored_blocks, 3);
    let data: Vec<_> = layout.blocks().map(|block| block.data).collect();

    let mut seen = HashSet::new();
    for y in 0..layout.height {
        let offsets = std::iter::once(png.filter_offset(y))
            .chain((0..layout.width).map(|x| png.pixel_offset(x, y)));
        for offset in offsets {
            assert!(seen.insert(offset), "offset {offset} used twice");
            assert!(
                data.iter().any(|range| range.contains(&offset)),
                "offset {offset} falls outside every block payload"
            );
        }
    }
    assert_eq!(seen.len(), layout.pixel_bytes);
    assert!(data.iter().all(|range| range.len() <= MAX_STORED_BLOCK));
}

#[test]
fn base64_decodes_to_finalized_bytes() {
    let mut png = banded(70, 1000);
    let encoded = png.to_base64();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(decoded, png.finalize());
}

#[test]
fn palette_overflow_stays_structurally_valid() {
    let capacity = 4;
    let mut png = IndexedPng::new(8, 8, capacity).unwrap();
    let slots: Vec<u8> = (0..=capacity as u8)
        .map(|i| png.register_opaque(i * 40, 0, 0))
        .collect();
    assert_eq!(slots, [0, 1, 2, 3, 0]);
    assert_eq!(png.register_opaque(4 * 40, 0, 0), 0);
    png.fill(|x, _| slots[x as usize % slots.len()]);

    let bytes = png.finalize();
    let summary = inspect::verify(&bytes).unwrap();
    assert_eq!(summary.palette.len(), capacity as usize);
    assert_eq!(summary.palette[3], Pixel::opaque(120, 0, 0));

    // The fifth color renders as the first.
    let image = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(*image.get_pixel(4, 0), image::Rgba([0, 0, 0, 255]));
    assert_eq!(image.get_pixel(4, 0), image.get_pixel(0, 0));
}

#[test]
fn idempotent_registration_across_finalize() {
    let mut png = checkerboard();
    png.finalize();
    assert_eq!(png.register_color(255, 255, 255, 255), 1);
    assert_eq!(png.register_color(0, 0, 0, 255), 0);
    assert_eq!(png.palette_len(), 2);
}
