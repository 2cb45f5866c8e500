use criterion::{Criterion, black_box};
use spark_rw_buffer::ReadWriteBuffer;
use std::{env, io::Read, thread, time::Duration};

/// 基准：衡量写端与读端的吞吐成本。
///
/// # 逻辑解析（How）
/// - `rw_buffer_same_thread`：单线程写入 64 KiB 后关闭写端，再由读端一次读完，
///   只计入追加、扩容与复制的开销；
/// - `rw_buffer_cross_thread`：写线程分 64 次追加 1 KiB，读线程同时消费，
///   计入条件变量唤醒与锁竞争的开销。
fn bench_same_thread(c: &mut Criterion) {
    let chunk = [0x5Au8; 1024];
    c.bench_function("rw_buffer_same_thread", |b| {
        b.iter(|| {
            let buffer = ReadWriteBuffer::new();
            let mut writer = buffer.open_writer();
            for _ in 0..64 {
                writer.put_slice(&chunk).unwrap();
            }
            writer.close();
            let mut sink = Vec::with_capacity(64 * 1024);
            buffer.open_reader().read_to_end(&mut sink).unwrap();
            black_box(sink)
        });
    });
}

fn bench_cross_thread(c: &mut Criterion) {
    c.bench_function("rw_buffer_cross_thread", |b| {
        b.iter(|| {
            let buffer = ReadWriteBuffer::new();
            let mut writer = buffer.open_writer();
            let mut reader = buffer.open_reader();
            let consumer = thread::spawn(move || {
                let mut sink = Vec::with_capacity(64 * 1024);
                reader.read_to_end(&mut sink).unwrap();
                sink.len()
            });
            let chunk = [0xA5u8; 1024];
            for _ in 0..64 {
                writer.put_slice(&chunk).unwrap();
            }
            writer.close();
            black_box(consumer.join().unwrap())
        });
    });
}

fn main() {
    let mut quick_mode = false;
    for arg in env::args().skip(1) {
        if arg == "--quick" {
            quick_mode = true;
        }
    }

    let mut criterion = Criterion::default();
    if quick_mode {
        criterion = criterion
            .sample_size(10)
            .warm_up_time(Duration::from_millis(100))
            .measurement_time(Duration::from_millis(250));
    }

    bench_same_thread(&mut criterion);
    bench_cross_thread(&mut criterion);
    criterion.final_summary();
}
