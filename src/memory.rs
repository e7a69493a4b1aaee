//! The GBA-shaped flat address space the core reads and writes.
#![allow(missing_docs)]

use byteorder::{ByteOrder, LittleEndian};

/// Address of the first byte of BIOS system ROM.
pub const BIOS_ROM_FIRST: u32 = 0x0000_0000;
/// Address of the last byte of BIOS system ROM.
pub const BIOS_ROM_LAST: u32 = 0x0000_3FFF;

/// Address of the first byte of on-board WRAM.
pub const WRAM_ON_BOARD_FIRST: u32 = 0x0200_0000;
/// Address of the last byte of on-board WRAM.
pub const WRAM_ON_BOARD_LAST: u32 = 0x0203_FFFF;

/// Address of the first byte of on-chip WRAM.
pub const WRAM_ON_CHIP_FIRST: u32 = 0x0300_0000;
/// Address of the last byte of on-chip WRAM.
pub const WRAM_ON_CHIP_LAST: u32 = 0x0300_7FFF;

/// Address of the first byte of the I/O register area.
pub const IO_REGISTERS_FIRST: u32 = 0x0400_0000;
/// Address of the last byte of the I/O register area.
pub const IO_REGISTERS_LAST: u32 = 0x0400_03FE;

/// Address of the first byte of palette RAM.
pub const PALETTE_RAM_FIRST: u32 = 0x0500_0000;
/// Address of the last byte of palette RAM.
pub const PALETTE_RAM_LAST: u32 = 0x0500_03FF;

/// Address of the first byte of VRAM.
pub const VRAM_FIRST: u32 = 0x0600_0000;
/// Address of the last byte of VRAM.
pub const VRAM_LAST: u32 = 0x0601_7FFF;

/// Address of the first byte of OAM.
pub const OBJ_ATTRIBUTES_FIRST: u32 = 0x0700_0000;
/// Address of the last byte of OAM.
pub const OBJ_ATTRIBUTES_LAST: u32 = 0x0700_03FF;

/// Address of the first byte of Game Pak ROM, wait state 0 mirror.
pub const GAME_PAK_WS0_ROM_FIRST: u32 = 0x0800_0000;
/// Address of the last byte of Game Pak ROM, wait state 0 mirror.
pub const GAME_PAK_WS0_ROM_LAST: u32 = 0x09FF_FFFF;
/// Address of the first byte of Game Pak ROM, wait state 1 mirror.
pub const GAME_PAK_WS1_ROM_FIRST: u32 = 0x0A00_0000;
/// Address of the last byte of Game Pak ROM, wait state 1 mirror.
pub const GAME_PAK_WS1_ROM_LAST: u32 = 0x0BFF_FFFF;
/// Address of the first byte of Game Pak ROM, wait state 2 mirror.
pub const GAME_PAK_WS2_ROM_FIRST: u32 = 0x0C00_0000;
/// Address of the last byte of Game Pak ROM, wait state 2 mirror.
pub const GAME_PAK_WS2_ROM_LAST: u32 = 0x0DFF_FFFF;

/// Address of the first byte of Game Pak SRAM.
pub const GAME_PAK_SRAM_FIRST: u32 = 0x0E00_0000;
/// Address of the last byte of Game Pak SRAM.
pub const GAME_PAK_SRAM_LAST: u32 = 0x0E00_FFFF;

/// Maximum size of a cartridge ROM image.
pub const GAME_PAK_ROM_MAX_LEN: usize = 32 * 1024 * 1024;

/// Maps a global address into one of the GBA's memory regions.
///
/// Mirrors the teacher's `PhysicalAddress`, but the three Game Pak ROM
/// wait-state mirrors collapse onto a single `GamePakRom` region, since
/// this core does not model wait states.
enum Region {
    BiosRom(u32),
    OnBoardWram(u32),
    OnChipWram(u32),
    RegistersIo(u32),
    PaletteRam(u32),
    Vram(u32),
    AttributesObj(u32),
    GamePakRom(u32),
    GamePakSram(u32),
    Invalid,
}

impl Region {
    fn from_addr(addr: u32) -> Region {
        match addr {
            BIOS_ROM_FIRST..=BIOS_ROM_LAST => Region::BiosRom(addr - BIOS_ROM_FIRST),
            WRAM_ON_BOARD_FIRST..=WRAM_ON_BOARD_LAST => Region::OnBoardWram(addr - WRAM_ON_BOARD_FIRST),
            WRAM_ON_CHIP_FIRST..=WRAM_ON_CHIP_LAST => Region::OnChipWram(addr - WRAM_ON_CHIP_FIRST),
            IO_REGISTERS_FIRST..=IO_REGISTERS_LAST => Region::RegistersIo(addr - IO_REGISTERS_FIRST),
            PALETTE_RAM_FIRST..=PALETTE_RAM_LAST => Region::PaletteRam(addr - PALETTE_RAM_FIRST),
            VRAM_FIRST..=VRAM_LAST => Region::Vram(addr - VRAM_FIRST),
            OBJ_ATTRIBUTES_FIRST..=OBJ_ATTRIBUTES_LAST => Region::AttributesObj(addr - OBJ_ATTRIBUTES_FIRST),
            GAME_PAK_WS0_ROM_FIRST..=GAME_PAK_WS0_ROM_LAST => Region::GamePakRom(addr - GAME_PAK_WS0_ROM_FIRST),
            GAME_PAK_WS1_ROM_FIRST..=GAME_PAK_WS1_ROM_LAST => Region::GamePakRom(addr - GAME_PAK_WS1_ROM_FIRST),
            GAME_PAK_WS2_ROM_FIRST..=GAME_PAK_WS2_ROM_LAST => Region::GamePakRom(addr - GAME_PAK_WS2_ROM_FIRST),
            GAME_PAK_SRAM_FIRST..=GAME_PAK_SRAM_LAST => Region::GamePakSram(addr - GAME_PAK_SRAM_FIRST),
            _ => Region::Invalid,
        }
    }
}

/// The six raw memory operations the core needs from a backing store.
///
/// Multi-byte accesses are little-endian. Addresses outside any mapped
/// region read as 0 and discard writes; this is not an error condition
/// in the default (non-strict) policy.
pub trait MemoryView {
    fn read_u8(&self, addr: u32) -> u8;
    fn read_u16(&self, addr: u32) -> u16;
    fn read_u32(&self, addr: u32) -> u32;
    fn write_u8(&mut self, addr: u32, data: u8);
    fn write_u16(&mut self, addr: u32, data: u16);
    fn write_u32(&mut self, addr: u32, data: u32);
}

/// A dense, region-backed implementation of [`MemoryView`] matching the
/// GBA's physical address map.
///
/// Each region is its own buffer rather than one 4 GiB allocation; the
/// observable behaviour is equivalent to a single dense buffer for any
/// address the core actually touches (§3 of the design spec).
pub struct GbaMemory {
    bios_rom: Vec<u8>,
    wram_on_board: Vec<u8>,
    wram_on_chip: Vec<u8>,
    io_registers: Vec<u8>,
    palette_ram: Vec<u8>,
    vram: Vec<u8>,
    oam: Vec<u8>,
    game_pak_rom: Vec<u8>,
    game_pak_sram: Vec<u8>,

    /// When set, out-of-range accesses are recorded rather than merely
    /// discarded. Off by default; intended for embedders/tests that want
    /// to promote `UnmappedAccess` to a hard failure instead of this
    /// core's default silent read-zero/write-discard policy.
    strict: bool,
    last_unmapped_access: Option<u32>,
}

impl GbaMemory {
    /// Builds a memory image from a BIOS image and an optional cartridge
    /// ROM image, zero-initialising every RAM-like region.
    pub fn new(bios: Vec<u8>, rom: Vec<u8>) -> GbaMemory {
        let mut bios_rom = bios;
        bios_rom.resize((BIOS_ROM_LAST - BIOS_ROM_FIRST + 1) as usize, 0);

        let mut game_pak_rom = rom;
        game_pak_rom.truncate(GAME_PAK_ROM_MAX_LEN);

        GbaMemory {
            bios_rom,
            wram_on_board: vec![0; (WRAM_ON_BOARD_LAST - WRAM_ON_BOARD_FIRST + 1) as usize],
            wram_on_chip: vec![0; (WRAM_ON_CHIP_LAST - WRAM_ON_CHIP_FIRST + 1) as usize],
            io_registers: vec![0; (IO_REGISTERS_LAST - IO_REGISTERS_FIRST + 1) as usize],
            palette_ram: vec![0; (PALETTE_RAM_LAST - PALETTE_RAM_FIRST + 1) as usize],
            vram: vec![0; (VRAM_LAST - VRAM_FIRST + 1) as usize],
            oam: vec![0; (OBJ_ATTRIBUTES_LAST - OBJ_ATTRIBUTES_FIRST + 1) as usize],
            game_pak_rom,
            game_pak_sram: vec![0; (GAME_PAK_SRAM_LAST - GAME_PAK_SRAM_FIRST + 1) as usize],
            strict: false,
            last_unmapped_access: None,
        }
    }

    /// Enables strict mode, in which out-of-range accesses are recorded
    /// via [`GbaMemory::take_unmapped_access`] instead of only being
    /// silently discarded.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Returns and clears the most recently recorded unmapped access, if
    /// strict mode is enabled and one occurred.
    pub fn take_unmapped_access(&mut self) -> Option<u32> {
        self.last_unmapped_access.take()
    }

    fn note_unmapped(&mut self, addr: u32) {
        if self.strict {
            self.last_unmapped_access = Some(addr);
        }
    }

    fn region_bytes(&self, region: &Region) -> Option<&[u8]> {
        match *region {
            Region::BiosRom(p) => Some(&self.bios_rom[p as usize..]),
            Region::OnBoardWram(p) => Some(&self.wram_on_board[(p as usize % self.wram_on_board.len())..]),
            Region::OnChipWram(p) => Some(&self.wram_on_chip[(p as usize % self.wram_on_chip.len())..]),
            Region::RegistersIo(p) => self.io_registers.get(p as usize..),
            Region::PaletteRam(p) => Some(&self.palette_ram[(p as usize % self.palette_ram.len())..]),
            Region::Vram(p) => self.vram.get(p as usize..),
            Region::AttributesObj(p) => Some(&self.oam[(p as usize % self.oam.len())..]),
            Region::GamePakRom(p) => {
                if self.game_pak_rom.is_empty() {
                    None
                } else {
                    Some(&self.game_pak_rom[(p as usize % self.game_pak_rom.len())..])
                }
            }
            Region::GamePakSram(p) => self.game_pak_sram.get(p as usize..),
            Region::Invalid => None,
        }
    }

    fn region_bytes_mut(&mut self, region: &Region) -> Option<&mut [u8]> {
        match *region {
            Region::BiosRom(_) => None, // BIOS is ROM: writes are discarded.
            Region::OnBoardWram(p) => {
                let len = self.wram_on_board.len();
                Some(&mut self.wram_on_board[(p as usize % len)..])
            }
            Region::OnChipWram(p) => {
                let len = self.wram_on_chip.len();
                Some(&mut self.wram_on_chip[(p as usize % len)..])
            }
            Region::RegistersIo(p) => self.io_registers.get_mut(p as usize..),
            Region::PaletteRam(p) => {
                let len = self.palette_ram.len();
                Some(&mut self.palette_ram[(p as usize % len)..])
            }
            Region::Vram(p) => self.vram.get_mut(p as usize..),
            Region::AttributesObj(p) => {
                let len = self.oam.len();
                Some(&mut self.oam[(p as usize % len)..])
            }
            Region::GamePakRom(_) => None, // Cartridge ROM: writes are discarded.
            Region::GamePakSram(p) => self.game_pak_sram.get_mut(p as usize..),
            Region::Invalid => None,
        }
    }
}

impl MemoryView for GbaMemory {
    fn read_u8(&self, addr: u32) -> u8 {
        match self.region_bytes(&Region::from_addr(addr)) {
            Some(bytes) if !bytes.is_empty() => bytes[0],
            _ => 0,
        }
    }

    fn read_u16(&self, addr: u32) -> u16 {
        match self.region_bytes(&Region::from_addr(addr)) {
            Some(bytes) if bytes.len() >= 2 => LittleEndian::read_u16(bytes),
            Some(bytes) if bytes.len() == 1 => bytes[0] as u16,
            _ => 0,
        }
    }

    fn read_u32(&self, addr: u32) -> u32 {
        match self.region_bytes(&Region::from_addr(addr)) {
            Some(bytes) if bytes.len() >= 4 => LittleEndian::read_u32(bytes),
            Some(bytes) if !bytes.is_empty() => {
                let mut buf = [0u8; 4];
                buf[..bytes.len().min(4)].copy_from_slice(&bytes[..bytes.len().min(4)]);
                LittleEndian::read_u32(&buf)
            }
            _ => 0,
        }
    }

    fn write_u8(&mut self, addr: u32, data: u8) {
        let region = Region::from_addr(addr);
        match self.region_bytes_mut(&region) {
            Some(bytes) if !bytes.is_empty() => bytes[0] = data,
            _ => self.note_unmapped(addr),
        }
    }

    fn write_u16(&mut self, addr: u32, data: u16) {
        let region = Region::from_addr(addr);
        match self.region_bytes_mut(&region) {
            Some(bytes) if bytes.len() >= 2 => LittleEndian::write_u16(bytes, data),
            _ => self.note_unmapped(addr),
        }
    }

    fn write_u32(&mut self, addr: u32, data: u32) {
        let region = Region::from_addr(addr);
        match self.region_bytes_mut(&region) {
            Some(bytes) if bytes.len() >= 4 => LittleEndian::write_u32(bytes, data),
            _ => self.note_unmapped(addr),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fresh() -> GbaMemory {
        GbaMemory::new(vec![0; 0x4000], vec![0; 0x1000])
    }

    #[test]
    fn word_round_trip_in_wram() {
        let mut mem = fresh();
        mem.write_u32(WRAM_ON_BOARD_FIRST + 4, 0xDEAD_BEEF);
        assert_eq!(mem.read_u32(WRAM_ON_BOARD_FIRST + 4), 0xDEAD_BEEF);
    }

    #[test]
    fn halfword_and_byte_round_trip() {
        let mut mem = fresh();
        mem.write_u16(WRAM_ON_CHIP_FIRST, 0xABCD);
        assert_eq!(mem.read_u16(WRAM_ON_CHIP_FIRST), 0xABCD);
        assert_eq!(mem.read_u8(WRAM_ON_CHIP_FIRST), 0xCD);
        assert_eq!(mem.read_u8(WRAM_ON_CHIP_FIRST + 1), 0xAB);
    }

    #[test]
    fn unmapped_reads_as_zero_and_discards_writes() {
        let mut mem = fresh();
        mem.write_u32(0xFFFF_0000, 0x1234_5678);
        assert_eq!(mem.read_u32(0xFFFF_0000), 0);
    }

    #[test]
    fn bios_and_rom_are_read_only() {
        let mut mem = fresh();
        mem.write_u8(BIOS_ROM_FIRST, 0xFF);
        assert_eq!(mem.read_u8(BIOS_ROM_FIRST), 0);
        mem.write_u8(GAME_PAK_WS0_ROM_FIRST, 0xFF);
        assert_eq!(mem.read_u8(GAME_PAK_WS0_ROM_FIRST), 0);
    }

    #[test]
    fn rom_mirrors_are_equivalent() {
        let mut mem = fresh();
        // Patch the underlying ROM buffer directly through the first mirror's
        // write path being disabled: construct with explicit content instead.
        let rom = (0..0x1000).map(|i| i as u8).collect::<Vec<_>>();
        let mem2 = GbaMemory::new(vec![0; 0x4000], rom);
        let a = mem2.read_u32(GAME_PAK_WS0_ROM_FIRST);
        let b = mem2.read_u32(GAME_PAK_WS1_ROM_FIRST);
        let c = mem2.read_u32(GAME_PAK_WS2_ROM_FIRST);
        assert_eq!(a, b);
        assert_eq!(b, c);
        let _ = &mut mem; // silence unused-mut warnings on some toolchains
    }

    #[test]
    fn strict_mode_records_unmapped_access() {
        let mut mem = fresh();
        mem.set_strict(true);
        mem.write_u8(0xFFFF_0000, 1);
        assert_eq!(mem.take_unmapped_access(), Some(0xFFFF_0000));
        assert_eq!(mem.take_unmapped_access(), None);
    }
}
