//! Derived totals for each document family.
//!
//! Forms compute line totals and document totals before a record is
//! stored; [`apply_totals`] performs the same arithmetic on a record so
//! that imported and edited records stay consistent.

use log::debug;

use super::{DataRecord, DocumentFamily};

/// Share of the proforma total due up front.
pub const RECEIVABLE_SHARE: f64 = 0.5;

/// Parse a numeric field. Blank or unparseable values count as zero.
pub fn parse_number(value: Option<&str>) -> f64 {
    value
        .map(|v| v.trim().replace(',', ""))
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Format a money amount with two decimals.
pub fn format_money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Format a count or weight without trailing zeros.
pub fn format_quantity(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Recompute line totals and document totals in place.
pub fn apply_totals(family: DocumentFamily, record: &mut DataRecord) {
    match family {
        DocumentFamily::PackingList => packing_list_totals(record),
        DocumentFamily::ProformaInvoice => proforma_totals(record),
        DocumentFamily::ExportInvoice => export_invoice_totals(record),
    }
}

fn packing_list_totals(record: &mut DataRecord) {
    let (mut boxes, mut net, mut gross) = (0.0, 0.0, 0.0);
    if let Some(items) = record.group(DocumentFamily::PackingList.group_key()) {
        for item in items {
            boxes += parse_number(item.get("box_count"));
            net += parse_number(item.get("net_weight"));
            gross += parse_number(item.get("gross_weight"));
        }
    }
    debug!("packing list totals: {} boxes, {} net, {} gross", boxes, net, gross);
    record.insert("total_boxes", format_quantity(boxes));
    record.insert("total_net_weight", format_quantity(net));
    record.insert("total_gross_weight", format_quantity(gross));
}

fn proforma_totals(record: &mut DataRecord) {
    let mut total = 0.0;
    if let Some(items) = record.group_mut(DocumentFamily::ProformaInvoice.group_key()) {
        for item in items.iter_mut() {
            let line = parse_number(item.get("quantity")) * parse_number(item.get("unit_rate"));
            item.insert("total", format_money(line));
            total += line;
        }
    }

    let receivable = total * RECEIVABLE_SHARE;
    let received = parse_number(record.scalar("received_amount"));
    debug!("proforma totals: total {:.2}, receivable {:.2}", total, receivable);

    record.insert("total_amount", format_money(total));
    record.insert("receivable_amount", format_money(receivable));
    record.insert(
        "receivable_amount_text",
        format!("{} dollars", number_to_words(receivable.trunc() as u64)),
    );
    record.insert("balance_amount", format_money(receivable - received));
}

fn export_invoice_totals(record: &mut DataRecord) {
    let mut export = 0.0;
    if let Some(items) = record.group_mut(DocumentFamily::ExportInvoice.group_key()) {
        for item in items.iter_mut() {
            let amount = parse_number(item.get("quantity")) * parse_number(item.get("rate"));
            item.insert("amount", format_money(amount));
            export += amount;
        }
    }
    let gst = parse_number(record.scalar("total_gst_value"));
    debug!("export invoice totals: export {:.2}, gst {:.2}", export, gst);

    record.insert("total_export_value", format_money(export));
    record.insert("total_invoice_value", format_money(export + gst));
}

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [&str; 7] = [
    "",
    "thousand",
    "million",
    "billion",
    "trillion",
    "quadrillion",
    "quintillion",
];

/// Spell out a whole number in English.
///
/// Groups of three digits are separated by commas and hundreds are joined
/// to the remainder with "and": `1234` reads
/// "one thousand, two hundred and thirty-four".
pub fn number_to_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut groups = Vec::new();
    let mut rest = n;
    while rest > 0 {
        groups.push((rest % 1000) as usize);
        rest /= 1000;
    }

    let mut parts = Vec::new();
    for (scale, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        let mut words = hundreds_to_words(group);
        if scale > 0 {
            words.push(' ');
            words.push_str(SCALES[scale]);
        }
        parts.push(words);
    }

    // A trailing group under one hundred reads "... thousand and five".
    let last = groups[0];
    if parts.len() > 1 && last > 0 && last < 100 {
        let tail = parts.pop().unwrap_or_default();
        let head = parts.join(", ");
        return format!("{} and {}", head, tail);
    }
    parts.join(", ")
}

fn hundreds_to_words(n: usize) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => tens_to_words(r),
        (h, 0) => format!("{} hundred", ONES[h]),
        (h, r) => format!("{} hundred and {}", ONES[h], tens_to_words(r)),
    }
}

fn tens_to_words(n: usize) -> String {
    if n < 20 {
        ONES[n].to_string()
    } else if n % 10 == 0 {
        TENS[n / 10].to_string()
    } else {
        format!("{}-{}", TENS[n / 10], ONES[n % 10])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ItemRecord;
    use serde_json::json;

    #[test]
    fn test_number_to_words() {
        assert_eq!(number_to_words(0), "zero");
        assert_eq!(number_to_words(7), "seven");
        assert_eq!(number_to_words(40), "forty");
        assert_eq!(number_to_words(99), "ninety-nine");
        assert_eq!(number_to_words(100), "one hundred");
        assert_eq!(number_to_words(250), "two hundred and fifty");
        assert_eq!(
            number_to_words(1234),
            "one thousand, two hundred and thirty-four"
        );
        assert_eq!(number_to_words(1005), "one thousand and five");
        assert_eq!(number_to_words(2_000_000), "two million");
        assert_eq!(
            number_to_words(3_000_120),
            "three million, one hundred and twenty"
        );
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some(" 12.5 ")), 12.5);
        assert_eq!(parse_number(Some("1,200")), 1200.0);
        assert_eq!(parse_number(Some("n/a")), 0.0);
        assert_eq!(parse_number(Some("NaN")), 0.0);
        assert_eq!(parse_number(None), 0.0);
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(12.0), "12");
        assert_eq!(format_quantity(10.5), "10.5");
        assert_eq!(format_quantity(0.0), "0");
    }

    #[test]
    fn test_proforma_totals() {
        let mut record = DataRecord::from_json(json!({
            "received_amount": "100",
            "line_items": [
                {"quantity": "2", "unit_rate": "150.5"},
                {"quantity": "4", "unit_rate": "250"}
            ]
        }))
        .unwrap();
        apply_totals(DocumentFamily::ProformaInvoice, &mut record);

        let items = record.group("line_items").unwrap();
        assert_eq!(items[0].get("total"), Some("301.00"));
        assert_eq!(items[1].get("total"), Some("1000.00"));
        assert_eq!(record.scalar("total_amount"), Some("1301.00"));
        assert_eq!(record.scalar("receivable_amount"), Some("650.50"));
        assert_eq!(
            record.scalar("receivable_amount_text"),
            Some("six hundred and fifty dollars")
        );
        assert_eq!(record.scalar("balance_amount"), Some("550.50"));
    }

    #[test]
    fn test_export_invoice_totals() {
        let mut record = DataRecord::from_json(json!({
            "total_gst_value": "18",
            "table": [
                {"quantity": "3", "rate": "10"},
                {"quantity": "x", "rate": "10"}
            ]
        }))
        .unwrap();
        apply_totals(DocumentFamily::ExportInvoice, &mut record);

        let items = record.group("table").unwrap();
        assert_eq!(items[0].get("amount"), Some("30.00"));
        assert_eq!(items[1].get("amount"), Some("0.00"));
        assert_eq!(record.scalar("total_export_value"), Some("30.00"));
        assert_eq!(record.scalar("total_invoice_value"), Some("48.00"));
    }

    #[test]
    fn test_packing_list_totals() {
        let mut record = DataRecord::new();
        record.insert(
            "items",
            vec![
                [("box_count", "3"), ("net_weight", "10.5"), ("gross_weight", "12")]
                    .into_iter()
                    .collect::<ItemRecord>(),
                [("box_count", "2"), ("net_weight", "4"), ("gross_weight", "5.25")]
                    .into_iter()
                    .collect::<ItemRecord>(),
            ],
        );
        apply_totals(DocumentFamily::PackingList, &mut record);
        assert_eq!(record.scalar("total_boxes"), Some("5"));
        assert_eq!(record.scalar("total_net_weight"), Some("14.5"));
        assert_eq!(record.scalar("total_gross_weight"), Some("17.25"));
    }

    #[test]
    fn test_missing_group_yields_zero_totals() {
        let mut record = DataRecord::new();
        apply_totals(DocumentFamily::ExportInvoice, &mut record);
        assert_eq!(record.scalar("total_export_value"), Some("0.00"));
        assert_eq!(record.scalar("total_invoice_value"), Some("0.00"));
    }
}
