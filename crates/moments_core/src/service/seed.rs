//! Fixed example entries shown on first launch.

use crate::model::memo::{MemoEntry, Mood};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use uuid::Uuid;

struct SeedRow {
    id: u128,
    content: &'static str,
    ymd_hm: (i32, u32, u32, u32, u32),
    mood: Mood,
    tags: [&'static str; 2],
}

const SEED_ROWS: [SeedRow; 5] = [
    SeedRow {
        id: 0x0193_fb2a_7c40_7000_8000_0000_0000_0001,
        content: "今天开始了一段新的旅程，心中充满期待与憧憬。每一个开始都是一次重生的机会。",
        ymd_hm: (2024, 12, 25, 9, 30),
        mood: Mood::Hopeful,
        tags: ["新开始", "感悟"],
    },
    SeedRow {
        id: 0x0193_fb2a_7c40_7000_8000_0000_0000_0002,
        content: "读完了《百年孤独》，马尔克斯的魔幻现实主义让我沉浸其中。时间是一条河流，我们都在其中漂流。",
        ymd_hm: (2024, 12, 23, 21, 15),
        mood: Mood::Thoughtful,
        tags: ["阅读", "文学"],
    },
    SeedRow {
        id: 0x0193_fb2a_7c40_7000_8000_0000_0000_0003,
        content: "深夜的城市格外安静，窗外的霓虹灯闪烁着，像是宇宙中遥远的星辰。在这样的夜晚，思绪总是特别清晰。",
        ymd_hm: (2024, 12, 20, 23, 45),
        mood: Mood::Peaceful,
        tags: ["夜晚", "思考"],
    },
    SeedRow {
        id: 0x0193_fb2a_7c40_7000_8000_0000_0000_0004,
        content: "完成了一个重要的项目，虽然过程艰辛，但看到成果的那一刻，所有的付出都值得了。",
        ymd_hm: (2024, 12, 18, 17, 0),
        mood: Mood::Accomplished,
        tags: ["工作", "成就"],
    },
    SeedRow {
        id: 0x0193_fb2a_7c40_7000_8000_0000_0000_0005,
        content: "和老友重逢，聊起往事，时光仿佛倒流。有些人，即使很久不见，再见时依然如故。",
        ymd_hm: (2024, 12, 15, 14, 30),
        mood: Mood::Nostalgic,
        tags: ["友情", "回忆"],
    },
];

/// Returns the fixed example list, most recent first.
pub fn seed_entries() -> Vec<MemoEntry> {
    SEED_ROWS
        .iter()
        .map(|row| {
            let (year, month, day, hour, minute) = row.ymd_hm;
            MemoEntry {
                id: Uuid::from_u128(row.id),
                content: row.content.to_string(),
                date: local_datetime(year, month, day, hour, minute),
                mood: Some(row.mood),
                tags: row.tags.iter().map(|tag| tag.to_string()).collect(),
            }
        })
        .collect()
}

/// Builds a local timestamp, resolving DST gaps/overlaps to the earliest
/// valid instant.
pub fn local_datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .unwrap_or_default();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}
