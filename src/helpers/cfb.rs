//! OLE Compound File Binary (CFB) container reader.
//! Legacy `.xls` workbooks store their BIFF8 record stream inside one of these.

use crate::error::ChromaSheetError;
use crate::helpers::bytes::le_index;
use crate::helpers::bytes::le_indexes;
use crate::helpers::bytes::le_u16;
use crate::helpers::bytes::le_u64;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;

const SIGNATURE: u64 = 0xE11A_B1A1_E011_CFD0;
const HEADER_SIZE: usize = 512;
const DIRECTORY_ENTRY_SIZE: usize = 128;
/// Ids at or above this value mark free / end-of-chain / table sectors.
const FIRST_SPECIAL_SECTOR: usize = 0xFFFF_FFFB;
/// Streams smaller than this live in the mini stream.
const MINI_STREAM_CUTOFF: usize = 4096;
const MINI_SECTOR_SIZE: usize = 64;
const ROOT_ENTRY: &str = "Root Entry";

#[derive(Error, Debug)]
pub enum CfbError {
    #[error("The file is corrupted or has an invalid CFB structure")]
    Corrupted,

    #[error("Invalid OLE signature (not an office document?)")]
    Signature,

    #[error("Invalid sector size '2 ^ {1}' for major version '{0}'")]
    SectorSize(u16, u16),

    #[error("Sector chain points at missing sector {0}")]
    BrokenChain(usize),

    #[error("Empty root directory")]
    EmptyDirectory,
}

/// Parsed compound file held fully in memory.
pub(crate) struct Cfb {
    entries: HashMap<String, Entry>,
    fat: Vec<usize>,
    sectors: Sectors,
    mini_fat: Vec<usize>,
    mini_sectors: Sectors,
}

impl Cfb {
    pub(crate) fn new<RS: Read + Seek>(reader: &mut RS) -> Result<Cfb, ChromaSheetError> {
        let size = reader.seek(SeekFrom::End(0))? as usize;
        if size < HEADER_SIZE {
            Err(CfbError::Corrupted)?;
        }
        reader.seek(SeekFrom::Start(0))?;
        let mut data = vec![0u8; size];
        reader.read_exact(&mut data)?;

        let header = Header::parse(&data[..HEADER_SIZE])?;
        let sectors = Sectors { data, size: header.sector_size()? };
        let fat = load_fat(&sectors, &header)?;
        let entries = load_entries(&fat, &sectors, header.directory_start)?;
        let mini_fat = if header.mini_fat_count > 0 {
            le_indexes(&sectors.chain(&fat, header.mini_fat_start)?).collect()
        } else {
            Vec::new()
        };
        let mini_data = match entries.get(ROOT_ENTRY) {
            Some(root) => {
                let mut data = sectors.chain(&fat, root.start)?;
                data.truncate(root.size);
                data
            }
            None => Vec::new(),
        };

        Ok(Cfb {
            entries,
            fat,
            sectors,
            mini_fat,
            mini_sectors: Sectors { data: mini_data, size: MINI_SECTOR_SIZE },
        })
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Reads a whole stream by name, or `None` when no such entry exists.
    pub(crate) fn read(&self, name: &str) -> Result<Option<Vec<u8>>, ChromaSheetError> {
        let Some(entry) = self.entries.get(name) else {
            return Ok(None);
        };
        let mut bytes = if entry.size < MINI_STREAM_CUTOFF {
            self.mini_sectors.mini_chain(&self.mini_fat, entry.start)?
        } else {
            self.sectors.chain(&self.fat, entry.start)?
        };
        bytes.truncate(entry.size);
        Ok(Some(bytes))
    }
}

/// Collects the FAT by walking the header DIFAT plus any DIFAT sector chain.
fn load_fat(sectors: &Sectors, header: &Header) -> Result<Vec<usize>, ChromaSheetError> {
    let mut difat: Vec<usize> = le_indexes(&sectors.data[76..HEADER_SIZE]).collect();
    let mut next = header.difat_start;
    let mut visited = 0usize;
    while next < FIRST_SPECIAL_SECTOR {
        visited += 1;
        if visited > header.difat_count + 1 {
            Err(CfbError::Corrupted)?;
        }
        difat.extend(le_indexes(sectors.get(next)?));
        next = difat.pop().ok_or(CfbError::Corrupted)?;
    }

    let mut fat = Vec::new();
    let mut count = 0usize;
    for index in difat.into_iter().filter(|index| *index < FIRST_SPECIAL_SECTOR) {
        fat.extend(le_indexes(sectors.get(index)?));
        count += 1;
    }
    if count != header.fat_count {
        Err(CfbError::Corrupted)?;
    }
    Ok(fat)
}

fn load_entries(fat: &[usize], sectors: &Sectors, start: usize) -> Result<HashMap<String, Entry>, ChromaSheetError> {
    let bytes = sectors.chain(fat, start)?;
    let entries: HashMap<String, Entry> = bytes
        .chunks_exact(DIRECTORY_ENTRY_SIZE)
        .map(Entry::parse)
        .collect();
    if entries.is_empty() {
        Err(CfbError::EmptyDirectory)?;
    }
    Ok(entries)
}

struct Sectors {
    data: Vec<u8>,
    size: usize,
}

impl Sectors {
    /// Regular sectors are numbered from the end of the header sector.
    fn get(&self, index: usize) -> Result<&[u8], ChromaSheetError> {
        let lower = (index + 1) * self.size;
        let upper = self.data.len().min(lower + self.size);
        if lower >= upper {
            Err(CfbError::BrokenChain(index))?;
        }
        Ok(&self.data[lower..upper])
    }

    fn get_mini(&self, index: usize) -> Result<&[u8], ChromaSheetError> {
        let lower = index * self.size;
        let upper = self.data.len().min(lower + self.size);
        if lower >= upper {
            Err(CfbError::BrokenChain(index))?;
        }
        Ok(&self.data[lower..upper])
    }

    fn chain(&self, table: &[usize], start: usize) -> Result<Vec<u8>, ChromaSheetError> {
        self.follow(table, start, Self::get)
    }

    fn mini_chain(&self, table: &[usize], start: usize) -> Result<Vec<u8>, ChromaSheetError> {
        self.follow(table, start, Self::get_mini)
    }

    fn follow<'a, F>(&'a self, table: &[usize], start: usize, sector: F) -> Result<Vec<u8>, ChromaSheetError>
    where
        F: Fn(&'a Self, usize) -> Result<&'a [u8], ChromaSheetError>,
    {
        let mut content = Vec::new();
        let mut index = start;
        let mut steps = 0usize;
        while index < FIRST_SPECIAL_SECTOR {
            steps += 1;
            if steps > table.len() {
                // a cycle in the allocation table
                Err(CfbError::Corrupted)?;
            }
            content.extend_from_slice(sector(self, index)?);
            index = *table.get(index).ok_or(CfbError::BrokenChain(index))?;
        }
        Ok(content)
    }
}

struct Header {
    major_version: u16,
    sector_shift: u16,
    fat_count: usize,
    directory_start: usize,
    mini_fat_start: usize,
    mini_fat_count: usize,
    difat_start: usize,
    difat_count: usize,
}

impl Header {
    fn parse(data: &[u8]) -> Result<Self, ChromaSheetError> {
        if le_u64(&data[0..8]) != SIGNATURE {
            Err(CfbError::Signature)?;
        }
        Ok(Header {
            major_version: le_u16(&data[26..28]),
            sector_shift: le_u16(&data[30..32]),
            fat_count: le_index(&data[44..48]),
            directory_start: le_index(&data[48..52]),
            mini_fat_start: le_index(&data[60..64]),
            mini_fat_count: le_index(&data[64..68]),
            difat_start: le_index(&data[68..72]),
            difat_count: le_index(&data[72..76]),
        })
    }

    fn sector_size(&self) -> Result<usize, ChromaSheetError> {
        match (self.major_version, self.sector_shift) {
            (3, 9) => Ok(512),
            (4, 12) => Ok(4096),
            (version, shift) => Err(CfbError::SectorSize(version, shift))?,
        }
    }
}

struct Entry {
    start: usize,
    size: usize,
}

impl Entry {
    fn parse(bytes: &[u8]) -> (String, Entry) {
        let name_size = (le_u16(&bytes[64..66]) as usize).min(64);
        let (name, _, _) = UTF_16LE.decode(&bytes[..name_size]);
        let name = match name.find('\0') {
            Some(position) => name[..position].to_owned(),
            None => name.into_owned(),
        };
        let entry = Entry {
            start: le_index(&bytes[116..120]),
            size: le_u64(&bytes[120..128]) as usize,
        };
        (name, entry)
    }
}
