//! Shared memory layout used by the launcher handshake.
//!
//! The launcher and the game map the same `0x20000` byte segment. It is split
//! into two equally sized parts, one per message direction:
//!
//! ```text
//! Byte offset  Part            Written by   Read by
//! ───────────────────────────────────────────────────
//! 0x00000      game part       game         launcher
//! 0x10000      launcher part   launcher     game
//! ```
//!
//! Each part holds at most one message at a time (see [`crate::channel`]).
//! Message kinds are field indices whose values depend on the edition the
//! game binary was built for. A mismatch between these tables and the game
//! build breaks the protocol.

use strum::{EnumIter, IntoStaticStr};

use crate::edition::{Edition, Store};

/// Size of one shared word (4 bytes / 32-bit integer)
pub const WORD: usize = 4;

/// Total size of the shared memory segment in bytes
pub const SEGMENT_SIZE: usize = 0x20000;

/// Size of one directional part in bytes
pub const PART_SIZE: usize = 0x10000;

/// Byte offset of the game part (game → launcher messages)
pub const GAME_PART_OFFSET: usize = 0;

/// Byte offset of the launcher part (launcher → game messages)
pub const LAUNCHER_PART_OFFSET: usize = 0x10000;

/// Number of words in one directional part
pub const PART_WORDS: usize = PART_SIZE / WORD;

/// FF7 (Steam) field indices
pub mod ff7 {
    pub const USER_SAVE_DIR: u32 = 10;
    pub const DOC_DIR: u32 = 11;
    pub const INSTALL_DIR: u32 = 12;
    pub const LOCALE_DATA_DIR: u32 = 13;
    pub const GAME_VERSION: u32 = 18;
    pub const DISABLE_CLOUD: u32 = 22;
    pub const END_USER_INFO: u32 = 24;
}

/// FF8 (Steam) field indices
pub mod ff8 {
    pub const USER_SAVE_DIR: u32 = 9;
    pub const DOC_DIR: u32 = 10;
    pub const INSTALL_DIR: u32 = 11;
    pub const LOCALE_DATA_DIR: u32 = 12;
    pub const GAME_VERSION: u32 = 17;
    pub const DISABLE_CLOUD: u32 = 21;
    pub const BG_PAUSE_ENABLED: u32 = 23;
    pub const END_USER_INFO: u32 = 24;
}

/// FF7 e-store edition field indices
pub mod estore {
    pub const USER_SAVE_DIR: u32 = 9;
    pub const DOC_DIR: u32 = 10;
    pub const INSTALL_DIR: u32 = 11;
    pub const LOCALE_DATA_DIR: u32 = 12;
    pub const GAME_VERSION: u32 = 17;
    pub const END_USER_INFO: u32 = 20;
}

/// A named slot in the edition's message table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    UserSaveDir,
    DocDir,
    InstallDir,
    LocaleDataDir,
    GameVersion,
    DisableCloud,
    BgPauseEnabled,
    EndUserInfo,
}

/// Field indices for one edition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTable {
    pub user_save_dir: u32,
    pub doc_dir: u32,
    pub install_dir: u32,
    pub locale_data_dir: u32,
    pub game_version: u32,
    pub disable_cloud: Option<u32>,
    pub bg_pause_enabled: Option<u32>,
    pub end_user_info: u32,
}

impl FieldTable {
    pub const FF7: Self = Self {
        user_save_dir: ff7::USER_SAVE_DIR,
        doc_dir: ff7::DOC_DIR,
        install_dir: ff7::INSTALL_DIR,
        locale_data_dir: ff7::LOCALE_DATA_DIR,
        game_version: ff7::GAME_VERSION,
        disable_cloud: Some(ff7::DISABLE_CLOUD),
        bg_pause_enabled: None,
        end_user_info: ff7::END_USER_INFO,
    };

    pub const FF8: Self = Self {
        user_save_dir: ff8::USER_SAVE_DIR,
        doc_dir: ff8::DOC_DIR,
        install_dir: ff8::INSTALL_DIR,
        locale_data_dir: ff8::LOCALE_DATA_DIR,
        game_version: ff8::GAME_VERSION,
        disable_cloud: Some(ff8::DISABLE_CLOUD),
        bg_pause_enabled: Some(ff8::BG_PAUSE_ENABLED),
        end_user_info: ff8::END_USER_INFO,
    };

    pub const ESTORE: Self = Self {
        user_save_dir: estore::USER_SAVE_DIR,
        doc_dir: estore::DOC_DIR,
        install_dir: estore::INSTALL_DIR,
        locale_data_dir: estore::LOCALE_DATA_DIR,
        game_version: estore::GAME_VERSION,
        disable_cloud: None,
        bg_pause_enabled: None,
        end_user_info: estore::END_USER_INFO,
    };

    pub fn for_edition(edition: Edition) -> Self {
        match edition {
            Edition::FF7(Store::Standard) => Self::FF7,
            Edition::FF7(Store::EStore) => Self::ESTORE,
            Edition::FF8 => Self::FF8,
        }
    }

    /// Index of `field`, or `None` when this edition has no such slot
    pub fn offset(&self, field: Field) -> Option<u32> {
        match field {
            Field::UserSaveDir => Some(self.user_save_dir),
            Field::DocDir => Some(self.doc_dir),
            Field::InstallDir => Some(self.install_dir),
            Field::LocaleDataDir => Some(self.locale_data_dir),
            Field::GameVersion => Some(self.game_version),
            Field::DisableCloud => self.disable_cloud,
            Field::BgPauseEnabled => self.bg_pause_enabled,
            Field::EndUserInfo => Some(self.end_user_info),
        }
    }

    /// Reverse lookup used when logging incoming messages
    pub fn field_for(&self, kind: u32) -> Option<Field> {
        use strum::IntoEnumIterator;
        Field::iter().find(|&field| self.offset(field) == Some(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    fn assert_no_overlap(table: FieldTable) {
        let offsets: Vec<u32> = Field::iter().filter_map(|f| table.offset(f)).collect();
        let unique: HashSet<u32> = offsets.iter().copied().collect();
        assert_eq!(offsets.len(), unique.len(), "overlap in {:?}", table);
    }

    #[test]
    fn test_tables_do_not_overlap() {
        assert_no_overlap(FieldTable::FF7);
        assert_no_overlap(FieldTable::FF8);
        assert_no_overlap(FieldTable::ESTORE);
    }

    #[test]
    fn test_parts_fill_segment() {
        assert_eq!(PART_SIZE * 2, SEGMENT_SIZE);
        assert_eq!(LAUNCHER_PART_OFFSET, GAME_PART_OFFSET + PART_SIZE);
        assert_eq!(PART_WORDS, 0x4000);
    }

    #[test]
    fn test_ff7_table() {
        let table = FieldTable::for_edition(Edition::FF7(Store::Standard));
        assert_eq!(table.offset(Field::UserSaveDir), Some(10));
        assert_eq!(table.offset(Field::LocaleDataDir), Some(13));
        assert_eq!(table.offset(Field::GameVersion), Some(18));
        assert_eq!(table.offset(Field::DisableCloud), Some(22));
        assert_eq!(table.offset(Field::BgPauseEnabled), None);
        assert_eq!(table.offset(Field::EndUserInfo), Some(24));
    }

    #[test]
    fn test_ff8_table() {
        let table = FieldTable::for_edition(Edition::FF8);
        assert_eq!(table.offset(Field::UserSaveDir), Some(9));
        assert_eq!(table.offset(Field::DisableCloud), Some(21));
        assert_eq!(table.offset(Field::BgPauseEnabled), Some(23));
        assert_eq!(table.offset(Field::EndUserInfo), Some(24));
    }

    #[test]
    fn test_estore_table() {
        let table = FieldTable::for_edition(Edition::FF7(Store::EStore));
        assert_eq!(table.offset(Field::LocaleDataDir), Some(12));
        assert_eq!(table.offset(Field::DisableCloud), None);
        assert_eq!(table.offset(Field::EndUserInfo), Some(20));
    }

    #[test]
    fn test_field_for_reverse_lookup() {
        assert_eq!(FieldTable::FF8.field_for(23), Some(Field::BgPauseEnabled));
        assert_eq!(FieldTable::FF7.field_for(23), None);
        assert_eq!(FieldTable::ESTORE.field_for(20), Some(Field::EndUserInfo));
    }

    #[test]
    fn test_field_names() {
        let name: &'static str = Field::LocaleDataDir.into();
        assert_eq!(name, "locale_data_dir");
    }
}
