#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::io::SeekFrom;
use xrofs::{encode_entry, encode_header, ByteOrder, ImageReader, ENTRY_LEN, HEADER_LEN};

#[derive(Arbitrary, Debug)]
enum Op {
    Start(u64),
    Current(i64),
    End(i64),
    Read(u16),
}

#[derive(Arbitrary, Debug)]
struct Input {
    content: Vec<u8>,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let size = input.content.len().min(0xffff);
    let content = &input.content[..size];

    let order = ByteOrder::Little;
    let mut image = encode_header(0x8000, 1, order);
    let offset = (HEADER_LEN + ENTRY_LEN) as u64;
    image.extend(encode_entry(size as u64, offset, order).unwrap());
    image.extend_from_slice(content);
    image.extend_from_slice(b"f\0");

    let reader = ImageReader::new(&image, order).unwrap();
    let mut file = reader.open("f").unwrap();
    let mut buf = vec![0u8; 1024];

    for op in input.ops {
        let before = file.position();
        let moved = match op {
            Op::Start(n) => file.seek(SeekFrom::Start(n)),
            Op::Current(n) => file.seek(SeekFrom::Current(n)),
            Op::End(n) => file.seek(SeekFrom::End(n)),
            Op::Read(n) => {
                let want = (n as usize).min(buf.len());
                let got = file.read_into(&mut buf[..want]);
                assert_eq!(&buf[..got], &content[before..before + got]);
                continue;
            }
        };
        match moved {
            Some(pos) => assert!((pos as usize) < size),
            None => assert_eq!(file.position(), before),
        }
        assert!(file.position() <= size);
    }
});
