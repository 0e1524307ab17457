//! 分帧器契约测试：在真实缓冲实现（线性 / 分段 / 只读包装）上驱动
//! 最长匹配定界分帧与长度字段分帧，覆盖跨段定界符、流式歧义消解与
//! 限额行为。

use bytes::Bytes;

use rill_buffer::{DirectStreamBuf, LinearStreamBuf, SegmentedStreamBuf};
use rill_codec_frame::{ByteOrder, DelimiterFramer, LengthFieldFramer};
use rill_core::buf::{ByteStreamBuf, MutByteStreamBuf};
use rill_core::error::codes;
use rill_core::view::ByteView;

fn frames_as_vecs(frames: Vec<ByteView>) -> Vec<Vec<u8>> {
    frames.into_iter().map(|f| f.to_vec()).collect()
}

fn cr_crlf_framer() -> DelimiterFramer {
    DelimiterFramer::new([Bytes::from_static(b"\r"), Bytes::from_static(b"\r\n")])
        .expect("framer")
}

/// 场景：`[\r, \r\n]`，先 `abc\r` 后 `\nxyz\rq`，分两次喂入。
fn exercise_deferred_disambiguation<B: MutByteStreamBuf>(buf: &mut B) {
    let framer = cr_crlf_framer();

    buf.write(b"abc\r").expect("write");
    let frames = framer.decode(buf, false).expect("decode");
    assert!(frames.is_empty(), "尾部 `\\r` 歧义未消解，不得出帧");

    buf.write(b"\nxyz\rq").expect("write");
    let frames = framer.decode(buf, false).expect("decode");
    assert_eq!(frames_as_vecs(frames), [b"abc".to_vec(), b"xyz".to_vec()]);
    assert_eq!(buf.peek().to_bytes().as_ref(), b"q");
}

#[test]
fn deferred_disambiguation_on_linear_buffer() {
    exercise_deferred_disambiguation(&mut LinearStreamBuf::new());
}

#[test]
fn deferred_disambiguation_on_segmented_buffer() {
    exercise_deferred_disambiguation(&mut SegmentedStreamBuf::new());
    exercise_deferred_disambiguation(&mut SegmentedStreamBuf::new().with_chunk_size(2));
}

#[test]
fn crlf_preferred_over_lf_at_same_offset() {
    // 场景：`[\n, \r\n]`，输入 `a\r\nb\n` → 帧 `a`、`b`，余量为空。
    let framer = DelimiterFramer::new([Bytes::from_static(b"\n"), Bytes::from_static(b"\r\n")])
        .expect("framer");
    let mut buf = SegmentedStreamBuf::new();
    buf.write(b"a\r\nb\n").expect("write");
    let frames = framer.decode(&mut buf, false).expect("decode");
    assert_eq!(frames_as_vecs(frames), [b"a".to_vec(), b"b".to_vec()]);
    assert!(buf.is_empty());
}

#[test]
fn keep_ends_retains_the_winning_delimiter() {
    // 场景：同上，`keep_ends=true` → 帧 `a\r\n`、`b\n`。
    let framer = DelimiterFramer::new([Bytes::from_static(b"\n"), Bytes::from_static(b"\r\n")])
        .expect("framer")
        .with_keep_ends(true);
    let mut buf = SegmentedStreamBuf::new();
    buf.write(b"a\r\nb\n").expect("write");
    let frames = framer.decode(&mut buf, false).expect("decode");
    assert_eq!(frames_as_vecs(frames), [b"a\r\n".to_vec(), b"b\n".to_vec()]);
}

#[test]
fn max_size_scenarios() {
    // 场景：`[\n]`、max_size=3：`abcd` 报 buffer.too_large；
    // `abc\nxxxx` 出帧 `abc` 并保留余量 `xxxx`。
    let framer = DelimiterFramer::new([Bytes::from_static(b"\n")])
        .expect("framer")
        .with_max_size(Some(3));

    let mut buf = SegmentedStreamBuf::new();
    buf.write(b"abcd").expect("write");
    let err = framer.decode(&mut buf, false).expect_err("无定界符超限");
    assert_eq!(err.code(), codes::BUFFER_TOO_LARGE);

    let mut buf = SegmentedStreamBuf::new();
    buf.write(b"abc\nxxxx").expect("write");
    let frames = framer.decode(&mut buf, false).expect("decode");
    assert_eq!(frames_as_vecs(frames), [b"abc".to_vec()]);
    assert_eq!(buf.peek().to_bytes().as_ref(), b"xxxx");
}

#[test]
fn delimiter_split_across_segments_is_found() {
    // Why: 定界符恰好被段缝切开是分段缓冲上最易漏帧的形态。
    let framer = DelimiterFramer::new([Bytes::from_static(b"\r\n")]).expect("framer");
    let mut buf = SegmentedStreamBuf::new();
    buf.write(b"one\r").expect("write");
    buf.write(b"\ntwo\r\n").expect("write");
    let frames = framer.decode(&mut buf, false).expect("decode");
    assert_eq!(frames_as_vecs(frames), [b"one".to_vec(), b"two".to_vec()]);
}

#[test]
fn streaming_byte_at_a_time_equals_batch() {
    // Why: 流式/批式等价是分帧器的核心性质——逐字节喂入与整段喂入
    // 产出的帧序列必须一致。
    let input = b"a\r\nbb\rccc\n\r\nd\re";
    let delims = [
        Bytes::from_static(b"\n"),
        Bytes::from_static(b"\r\n"),
        Bytes::from_static(b"\r"),
    ];

    let framer = DelimiterFramer::new(delims.clone()).expect("framer");
    let mut batch_buf = SegmentedStreamBuf::new();
    batch_buf.write(input).expect("write");
    let mut batch = framer.decode(&mut batch_buf, true).expect("batch decode");

    let mut streaming_buf = SegmentedStreamBuf::new();
    let mut streaming = Vec::new();
    for byte in input {
        streaming_buf.write(&[*byte]).expect("write");
        streaming.extend(framer.decode(&mut streaming_buf, false).expect("decode"));
    }
    streaming.extend(framer.decode(&mut streaming_buf, true).expect("final decode"));
    batch.extend(framer.decode(&mut batch_buf, true).expect("batch tail"));

    assert_eq!(frames_as_vecs(streaming), frames_as_vecs(batch));
    assert_eq!(
        streaming_buf.peek().to_bytes(),
        batch_buf.peek().to_bytes(),
        "两种喂入方式的余量也必须一致"
    );
}

#[test]
fn framing_works_on_read_only_direct_buffer() {
    // Why: 分帧器只依赖只读契约，数据已在内存时可就地切分。
    let framer = DelimiterFramer::new([Bytes::from_static(b"\n")]).expect("framer");
    let mut buf = DirectStreamBuf::new(&b"one\ntwo\nthree"[..]);
    let frames = framer.decode(&mut buf, true).expect("decode");
    assert_eq!(frames_as_vecs(frames), [b"one".to_vec(), b"two".to_vec()]);
    // 未终结的尾巴不出帧，留存缓冲由调用方决定去留。
    assert_eq!(buf.peek().to_bytes().as_ref(), b"three");
}

#[test]
fn length_field_frames_over_segmented_buffer() {
    // 2 字节大端长度前缀，头部恰被段缝切开，coalesce 透明合并。
    let framer = LengthFieldFramer::new()
        .with_length_field(0, 2)
        .expect("config")
        .with_byte_order(ByteOrder::Big)
        .with_strip(2);
    let mut buf = SegmentedStreamBuf::new();
    buf.write(&[0x00]).expect("write");
    buf.write(&[0x05]).expect("write");
    buf.write(b"hello").expect("write");
    buf.write(&[0x00, 0x02, b'h', b'i']).expect("write");
    let frames = framer.decode(&mut buf).expect("decode");
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].to_bytes().as_ref(), b"hello");
    assert_eq!(frames[1].to_bytes().as_ref(), b"hi");
    assert!(buf.is_empty());
}
