//! services/api/src/adapters/quran_catalog.rs
//!
//! The reference catalog of surahs as a static table: verse counts and the range of
//! juz each surah has verses in. Implements the core's `TextCatalog` port.

use async_trait::async_trait;
use recitation_core::domain::TextUnit;
use recitation_core::ports::{PortResult, TextCatalog};

pub const JUZ_COUNT: u32 = 30;

/// (surah number, name, verse count, first juz, last juz)
const SURAHS: [(u32, &str, u32, u32, u32); 114] = [
    (1, "Al-Fatihah", 7, 1, 1),
    (2, "Al-Baqarah", 286, 1, 3),
    (3, "Ali 'Imran", 200, 3, 4),
    (4, "An-Nisa", 176, 4, 6),
    (5, "Al-Ma'idah", 120, 6, 7),
    (6, "Al-An'am", 165, 7, 8),
    (7, "Al-A'raf", 206, 8, 9),
    (8, "Al-Anfal", 75, 9, 10),
    (9, "At-Tawbah", 129, 10, 11),
    (10, "Yunus", 109, 11, 11),
    (11, "Hud", 123, 11, 12),
    (12, "Yusuf", 111, 12, 13),
    (13, "Ar-Ra'd", 43, 13, 13),
    (14, "Ibrahim", 52, 13, 13),
    (15, "Al-Hijr", 99, 14, 14),
    (16, "An-Nahl", 128, 14, 14),
    (17, "Al-Isra", 111, 15, 15),
    (18, "Al-Kahf", 110, 15, 16),
    (19, "Maryam", 98, 16, 16),
    (20, "Taha", 135, 16, 16),
    (21, "Al-Anbya", 112, 17, 17),
    (22, "Al-Hajj", 78, 17, 17),
    (23, "Al-Mu'minun", 118, 18, 18),
    (24, "An-Nur", 64, 18, 18),
    (25, "Al-Furqan", 77, 18, 19),
    (26, "Ash-Shu'ara", 227, 19, 19),
    (27, "An-Naml", 93, 19, 20),
    (28, "Al-Qasas", 88, 20, 20),
    (29, "Al-'Ankabut", 69, 20, 21),
    (30, "Ar-Rum", 60, 21, 21),
    (31, "Luqman", 34, 21, 21),
    (32, "As-Sajdah", 30, 21, 21),
    (33, "Al-Ahzab", 73, 21, 22),
    (34, "Saba", 54, 22, 22),
    (35, "Fatir", 45, 22, 22),
    (36, "Ya-Sin", 83, 22, 23),
    (37, "As-Saffat", 182, 23, 23),
    (38, "Sad", 88, 23, 23),
    (39, "Az-Zumar", 75, 23, 24),
    (40, "Ghafir", 85, 24, 24),
    (41, "Fussilat", 54, 24, 25),
    (42, "Ash-Shuraa", 53, 25, 25),
    (43, "Az-Zukhruf", 89, 25, 25),
    (44, "Ad-Dukhan", 59, 25, 25),
    (45, "Al-Jathiyah", 37, 25, 25),
    (46, "Al-Ahqaf", 35, 26, 26),
    (47, "Muhammad", 38, 26, 26),
    (48, "Al-Fath", 29, 26, 26),
    (49, "Al-Hujurat", 18, 26, 26),
    (50, "Qaf", 45, 26, 26),
    (51, "Adh-Dhariyat", 60, 26, 27),
    (52, "At-Tur", 49, 27, 27),
    (53, "An-Najm", 62, 27, 27),
    (54, "Al-Qamar", 55, 27, 27),
    (55, "Ar-Rahman", 78, 27, 27),
    (56, "Al-Waqi'ah", 96, 27, 27),
    (57, "Al-Hadid", 29, 27, 27),
    (58, "Al-Mujadila", 22, 28, 28),
    (59, "Al-Hashr", 24, 28, 28),
    (60, "Al-Mumtahanah", 13, 28, 28),
    (61, "As-Saf", 14, 28, 28),
    (62, "Al-Jumu'ah", 11, 28, 28),
    (63, "Al-Munafiqun", 11, 28, 28),
    (64, "At-Taghabun", 18, 28, 28),
    (65, "At-Talaq", 12, 28, 28),
    (66, "At-Tahrim", 12, 28, 28),
    (67, "Al-Mulk", 30, 29, 29),
    (68, "Al-Qalam", 52, 29, 29),
    (69, "Al-Haqqah", 52, 29, 29),
    (70, "Al-Ma'arij", 44, 29, 29),
    (71, "Nuh", 28, 29, 29),
    (72, "Al-Jinn", 28, 29, 29),
    (73, "Al-Muzzammil", 20, 29, 29),
    (74, "Al-Muddaththir", 56, 29, 29),
    (75, "Al-Qiyamah", 40, 29, 29),
    (76, "Al-Insan", 31, 29, 29),
    (77, "Al-Mursalat", 50, 29, 29),
    (78, "An-Naba", 40, 30, 30),
    (79, "An-Nazi'at", 46, 30, 30),
    (80, "'Abasa", 42, 30, 30),
    (81, "At-Takwir", 29, 30, 30),
    (82, "Al-Infitar", 19, 30, 30),
    (83, "Al-Mutaffifin", 36, 30, 30),
    (84, "Al-Inshiqaq", 25, 30, 30),
    (85, "Al-Buruj", 22, 30, 30),
    (86, "At-Tariq", 17, 30, 30),
    (87, "Al-A'la", 19, 30, 30),
    (88, "Al-Ghashiyah", 26, 30, 30),
    (89, "Al-Fajr", 30, 30, 30),
    (90, "Al-Balad", 20, 30, 30),
    (91, "Ash-Shams", 15, 30, 30),
    (92, "Al-Layl", 21, 30, 30),
    (93, "Ad-Duhaa", 11, 30, 30),
    (94, "Ash-Sharh", 8, 30, 30),
    (95, "At-Tin", 8, 30, 30),
    (96, "Al-'Alaq", 19, 30, 30),
    (97, "Al-Qadr", 5, 30, 30),
    (98, "Al-Bayyinah", 8, 30, 30),
    (99, "Az-Zalzalah", 8, 30, 30),
    (100, "Al-'Adiyat", 11, 30, 30),
    (101, "Al-Qari'ah", 11, 30, 30),
    (102, "At-Takathur", 8, 30, 30),
    (103, "Al-'Asr", 3, 30, 30),
    (104, "Al-Humazah", 9, 30, 30),
    (105, "Al-Fil", 5, 30, 30),
    (106, "Quraysh", 4, 30, 30),
    (107, "Al-Ma'un", 7, 30, 30),
    (108, "Al-Kawthar", 3, 30, 30),
    (109, "Al-Kafirun", 6, 30, 30),
    (110, "An-Nasr", 3, 30, 30),
    (111, "Al-Masad", 5, 30, 30),
    (112, "Al-Ikhlas", 4, 30, 30),
    (113, "Al-Falaq", 5, 30, 30),
    (114, "An-Nas", 6, 30, 30),
];

#[derive(Clone, Debug)]
pub struct QuranCatalog {
    units: Vec<TextUnit>,
}

impl QuranCatalog {
    pub fn new() -> Self {
        let units = SURAHS
            .iter()
            .map(|&(unit_number, name, verse_count, first, last)| TextUnit {
                unit_number,
                verse_count,
                name: name.to_string(),
                groups: (first..=last).collect(),
            })
            .collect();
        Self { units }
    }
}

impl Default for QuranCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextCatalog for QuranCatalog {
    async fn list_units(&self) -> PortResult<Vec<TextUnit>> {
        Ok(self.units.clone())
    }

    async fn units_in_groups(&self, group_ids: &[u32]) -> PortResult<Vec<TextUnit>> {
        Ok(self
            .units
            .iter()
            .filter(|u| u.groups.iter().any(|g| group_ids.contains(g)))
            .cloned()
            .collect())
    }

    async fn list_groups(&self) -> PortResult<Vec<u32>> {
        Ok((1..=JUZ_COUNT).collect())
    }
}
