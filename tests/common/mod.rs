#![allow(dead_code)]

use anyhow::Result;
use chroma_sheet::InMemoryCatalog;
use chroma_sheet::ProductSchema;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use std::path::PathBuf;

pub type Rows = Vec<Vec<&'static str>>;

pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(vec![
        ProductSchema::new("Prod001", ["Acidic_2", "Acidic_1", "Native"], []),
        ProductSchema::new("Prod002", ["Main", "Strip"], ["HCP"]),
    ])
}

/// Writes each sheet's rows; numeric literals become number cells, empty
/// strings stay blank.
pub fn write_workbook(dir: &Path, file_name: &str, sheets: &[(&str, Rows)]) -> Result<PathBuf> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.trim().parse::<f64>() {
                    Ok(number) => worksheet.write_number(row as u32, col as u16, number)?,
                    Err(_) => worksheet.write_string(row as u32, col as u16, *value)?,
                };
            }
        }
    }
    let path = dir.join(file_name);
    workbook.save(&path)?;
    Ok(path)
}

/// A current-revision study: one load, one buffer and two experiments, the
/// first with fractions on the "Run 1 Fractions" sheet.
pub fn v2_study(version: &'static str) -> Rows {
    vec![
        vec!["Excel Input File", "", "", "", version],
        vec!["General Study Information"],
        vec!["", "Product Name", "", "Prod001"],
        vec!["", "Study Name", "", "Resin screening"],
        vec!["", "Study ID", "", "S-001"],
        vec!["", "Study Type", "", "Screening"],
        vec!["", "Study Purpose", "", "Capacity"],
        vec!["", "Site", "", "Lab 2"],
        vec!["", "Column Placement", "", "Bench"],
        vec!["", "Experimentalist", "", "Sam"],
        vec!["Chromatography System Information"],
        vec!["", "System Type", "", "AKTA"],
        vec!["", "System Name", "", "Avant 1"],
        vec!["", "System ID", "", "SYS-1"],
        vec!["", "Holdup Pump to Loop", "mL", "0.5"],
        vec!["", "Holdup Loop to Column", "mL", "0.25"],
        vec!["", "Holdup Column to Detector", "mL", "0.75"],
        vec!["", "Detector Pathlength", "cm", "0.2"],
        vec!["Chromatography Column Information"],
        vec!["", "Packed Column Lot ID", "", "PC-1"],
        vec!["", "Resin Type", "", "Q Sepharose"],
        vec!["", "Resin Lot ID", "", "R-1"],
        vec!["", "Column Model", "", "Tricorn 5/50"],
        vec!["", "Column Description", "", "small"],
        vec!["", "Packed Bed Height", "cm", "20"],
        vec!["", "Compression Factor", "", "1.15"],
        vec!["", "HETP", "cm", "0.03"],
        vec!["", "Asymmetry", "", "1.1"],
        vec!["Load Information"],
        vec!["", "Load Name", "", "Load 1"],
        vec!["", "Source", "", "Harvest"],
        vec!["", "Description", "", "clarified"],
        vec!["", "Lot ID", "", "L-1"],
        vec!["", "Product Concentration", "g/L", "4.5"],
        vec!["", "Density", "g/mL", "1"],
        vec!["", "Conductivity", "mS/cm", "12"],
        vec!["", "pH", "", "7.2"],
        vec!["", "Temperature", "C", "21"],
        vec!["", "Product Component Assays"],
        vec!["", "Acidic_2", "%", "8.4"],
        vec!["", "Acidic_1", "%", "88.2"],
        vec!["", "Native", "%", "3.6"],
        vec!["", "Chemical Components"],
        vec!["", "Component 1 Name", "", "NaCl"],
        vec!["", "Component 1 Concentration", "mM", "50"],
        vec![""],
        vec!["Buffer Information"],
        vec!["", "Buffer Name", "", "Equil Buffer"],
        vec!["", "Source", "", "Prep"],
        vec!["", "Description", "", "equilibration"],
        vec!["", "Lot ID", "", "B-1"],
        vec!["", "Volume", "L", "2"],
        vec!["", "Density", "g/mL", "1"],
        vec!["", "Conductivity", "mS/cm", "5"],
        vec!["", "pH", "", "7"],
        vec!["", "Temperature", "C", "20"],
        vec!["", "Solid Additions"],
        vec!["", "Solid 1 Name", "", "NaCl"],
        vec!["", "Solid 1 Amount", "g", "5.8"],
        vec!["", "Solid 2 Name", "", "Tris"],
        vec!["", "Solid 2 Amount", "g", "1.2"],
        vec!["", "Liquid Additions"],
        vec!["", "Liquid 1 Name", "", "Acetic acid"],
        vec!["", "Liquid 1 Concentration", "M", "1"],
        vec!["", "Liquid 1 Amount", "mL", "10"],
        vec!["", "Liquid 2 Name", "", "NaOH"],
        vec!["", "Liquid 2 Concentration", "M", "2"],
        vec!["", "Liquid 2 Amount", "mL", "3"],
        vec![""],
        vec!["Method Information"],
        vec!["", "Experiment Name", "", "Run 1", "Run 2"],
        vec!["", "Run Type", "", "Gradient", "Step"],
        vec!["", "Step 1 Name", "", "Equilibration", "Equilibration"],
        vec!["", "Step Type", "", "Equilibration", "Equilibration"],
        vec!["", "Buffer Name", "", "Equil Buffer", "Equil Buffer"],
        vec!["", "Step Volume", "CV", "5", "5"],
        vec!["", "Step Flow Rate", "cm/hr", "150", "150"],
        vec!["", "Step 2 Name", "", "Load", "Load"],
        vec!["", "Step Type", "", "Load", "Load"],
        vec!["", "Load Name", "", "Load 1", "Load 1"],
        vec!["", "Step Volume", "CV", "10", "12"],
        vec!["", "Step Flow Rate", "cm/hr", "100", "100"],
        vec!["", "Step 3 Name", "", "Elution", "Elution"],
        vec!["", "Step Type", "", "Gradient Elution", "Step Elution"],
        vec!["", "Buffer Name", "", "Equil Buffer", "NA"],
        vec!["", "Step Volume", "CV", "20", "8"],
        vec!["", "Step Flow Rate", "cm/hr", "100", "100"],
        vec![""],
        vec!["Collection criteria information"],
        vec!["", "Collect?", "", "Yes", "No"],
        vec!["", "Collection step", "", "elution"],
        vec!["", "Start Collection Type", "", "UV"],
        vec!["", "Start Collection Target", "mAU", "100"],
        vec!["", "Start Collection While", "", "Ascending"],
        vec!["", "Stop Collection Type", "", "UV"],
        vec!["", "Stop Collection Target", "mAU", "50"],
        vec!["", "Stop Collection While", "", "Descending"],
        vec![""],
        vec!["Performance Parameters"],
        vec!["", "Pool collected?", "", "Yes", "No"],
        vec!["", "Pool Volume", "CV", "3"],
        vec!["", "Step Yield", "%", "85"],
        vec!["", "Pool Concentration", "g/L", "2.5"],
        vec!["", "Conductivity", "mS/cm", "20"],
        vec!["", "pH", "", "5.5"],
        vec!["", "Pool Assays"],
        vec!["", "Acidic_2", "%", "5"],
        vec!["", "Acidic_1", "%", "90"],
        vec!["", "Native", "%", "5"],
        vec![""],
        vec!["Fraction Data"],
        vec!["", "Fractions analyzed?", "", "Yes", "No"],
        vec!["", "Fraction sheet", "", "Run 1 Fractions"],
        vec![""],
        vec!["Continuous Data"],
        vec!["", "Continuous data file", "", "run1.csv", "NA"],
    ]
}

pub fn fractions(header: Vec<&'static str>) -> Rows {
    let width = header.len();
    let row = |values: [&'static str; 6]| values[..width].to_vec();
    vec![
        header,
        vec!["", "min", "g/L", "%", "%", "%"][..width].to_vec(),
        row(["1", "10.5", "0.8", "20", "70", "10"]),
        row(["2", "", "", "", "", ""]),
        row(["3", "12.5", "1.2", "30", "60", "10"]),
    ]
}
