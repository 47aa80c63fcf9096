//! Common regex patterns for Partner Fillo invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number patterns
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?i)Fatura\s+No[\s:]*([A-Z]{2,4}\d{6,16})"
    ).unwrap();

    pub static ref INVOICE_NUMBER_STANDALONE: Regex = Regex::new(
        r"\b(PFS\d{10,16})\b"
    ).unwrap();

    // Invoice date patterns
    pub static ref INVOICE_DATE: Regex = Regex::new(
        r"(?i)Fatura\s+Tarihi[\s:]*(\d{1,2}[-./]\d{1,2}[-./]\d{4})"
    ).unwrap();

    pub static ref LABELED_DATE: Regex = Regex::new(
        r"(?i)\bTarih[i]?[\s:]*(\d{1,2}[-./]\d{1,2}[-./]\d{4})"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[-./](\d{1,2})[-./](\d{4})\b"
    ).unwrap();

    // Net amount label. OCR frequently renders "Tutarı" as "Tutan" or
    // "Tutar", so all three spellings are accepted.
    pub static ref NET_AMOUNT: Regex = Regex::new(
        r"(?i)Malzeme/Hizmet\s+Toplam\s+Tuta[rn]ı?[\s:]*([\d.,]+)\s*(?:TL)?"
    ).unwrap();

    // Calculated VAT label: "Hesaplanan KDV (%20)" or "KDV (% 20,00)"
    pub static ref VAT_RATE: Regex = Regex::new(
        r"(?i)(?:Hesaplanan\s+)?KDV\s*\(\s*%\s*(\d{1,2})(?:\s*,\s*\d{1,2})?\s*\)"
    ).unwrap();

    // Payable total stated on the PDF
    pub static ref STATED_TOTAL: Regex = Regex::new(
        r"(?i)(?:Ödenecek\s+Tutar|Vergiler\s+Dahil\s+Toplam\s+Tutar)ı?[\s:]*([\d.,]+)\s*(?:TL)?"
    ).unwrap();

    // Product code triggers, found on the last page
    pub static ref LINE1_TRIGGER: Regex = Regex::new(
        r"(?i)\bLINE[\s-]*1\b"
    ).unwrap();

    pub static ref LINE2_TRIGGER: Regex = Regex::new(
        r"(?i)\bLINE[\s-]*2\b"
    ).unwrap();
}
