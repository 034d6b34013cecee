//! The three document families of the suite.

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::schema::{FieldKind, FieldSpec, GroupSpec, Schema};
use super::totals::apply_totals;
use super::DataRecord;
use crate::error::Error;

/// A document family: one form, one store collection, one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFamily {
    /// Packing list
    PackingList,
    /// Proforma invoice
    ProformaInvoice,
    /// Export invoice (form ZC/IN/07)
    ExportInvoice,
}

impl DocumentFamily {
    /// All families, in dashboard order.
    pub const ALL: [DocumentFamily; 3] = [
        DocumentFamily::PackingList,
        DocumentFamily::ExportInvoice,
        DocumentFamily::ProformaInvoice,
    ];

    /// Stable identifier, also used as the store collection name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFamily::PackingList => "packing_list",
            DocumentFamily::ProformaInvoice => "proforma_invoice",
            DocumentFamily::ExportInvoice => "export_invoice",
        }
    }

    /// Display title.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentFamily::PackingList => "Packing List",
            DocumentFamily::ProformaInvoice => "Proforma Invoice",
            DocumentFamily::ExportInvoice => "Export Invoice ZC/IN/07",
        }
    }

    /// Key of the repeating group that drives the item table.
    pub fn group_key(&self) -> &'static str {
        match self {
            DocumentFamily::PackingList => "items",
            DocumentFamily::ProformaInvoice => "line_items",
            DocumentFamily::ExportInvoice => "table",
        }
    }

    /// Default template file name inside the template directory.
    pub fn template_file(&self) -> String {
        format!("{}.json", self.as_str())
    }

    /// Prefix of printed output file names.
    pub fn output_prefix(&self) -> &'static str {
        match self {
            DocumentFamily::PackingList => "Packaging-List",
            DocumentFamily::ProformaInvoice => "Proforma-Invoice",
            DocumentFamily::ExportInvoice => "ZC-IN-07",
        }
    }

    /// Dated output file name, e.g. `Packaging-List-16October2026-3.05pm.json`.
    pub fn output_file_name<Tz: TimeZone>(&self, at: &DateTime<Tz>, extension: &str) -> String
    where
        Tz::Offset: fmt::Display,
    {
        let (is_pm, hour12) = at.hour12();
        format!(
            "{}-{}-{}.{:02}{}.{}",
            self.output_prefix(),
            at.format("%-d%B%Y"),
            hour12,
            at.minute(),
            if is_pm { "pm" } else { "am" },
            extension.trim_start_matches('.')
        )
    }

    /// Field that identifies a record in listings.
    pub fn headline_key(&self) -> &'static str {
        match self {
            DocumentFamily::PackingList => "po_no",
            DocumentFamily::ProformaInvoice | DocumentFamily::ExportInvoice => "invoice_no",
        }
    }

    /// Compute derived totals, then validate against the schema.
    ///
    /// This is the input boundary for form submissions and edits.
    pub fn prepare(&self, mut record: DataRecord) -> Result<DataRecord, Error> {
        apply_totals(*self, &mut record);
        self.schema().validate(&record)?;
        Ok(record)
    }

    /// The declared form schema.
    pub fn schema(&self) -> Schema {
        match self {
            DocumentFamily::PackingList => packing_list_schema(),
            DocumentFamily::ProformaInvoice => proforma_invoice_schema(),
            DocumentFamily::ExportInvoice => export_invoice_schema(),
        }
    }
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' ', '/'], "_");
        match normalized.as_str() {
            "packing_list" | "packaging_list" | "packing" => Ok(DocumentFamily::PackingList),
            "proforma_invoice" | "proforma" => Ok(DocumentFamily::ProformaInvoice),
            "export_invoice" | "zc_in_07" | "zc_in" | "export" => Ok(DocumentFamily::ExportInvoice),
            _ => Err(Error::Other(format!("Unknown document family: {}", s))),
        }
    }
}

fn number(name: &str, label: &str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Number)
}

fn date(name: &str, label: &str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Date)
}

fn choice(name: &str, label: &str, options: &[&str]) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::choice(options.iter().copied()))
}

fn packing_list_schema() -> Schema {
    Schema::new(
        vec![
            FieldSpec::text("consignee_address", "Consignee Address").required(),
            FieldSpec::text("delivery_address", "Delivery Address").required(),
            FieldSpec::text("exporter_address", "Exporter Address"),
            date("date", "Date"),
            FieldSpec::text("tax_no", "Tax No"),
            FieldSpec::text("po_no", "PO No"),
            FieldSpec::text("loding_port", "Loading Port"),
            FieldSpec::text("discharge_port", "Discharge Port"),
            FieldSpec::text("hs_code", "HS Code"),
            number("total_boxes", "Total Boxes"),
            number("total_net_weight", "Total Net Weight"),
            number("total_gross_weight", "Total Gross Weight"),
        ],
        vec![GroupSpec::new(
            "items",
            "Items",
            vec![
                number("item_number", "Item No").required(),
                FieldSpec::text("material", "Material").required(),
                FieldSpec::text("packaging_description", "Packaging Description").required(),
                number("box_count", "Boxes").required(),
                FieldSpec::text("dimensions", "Dimensions (L x W x H)"),
                number("net_weight", "Net Weight"),
                number("gross_weight", "Gross Weight"),
            ],
        )
        .required()],
    )
}

fn proforma_invoice_schema() -> Schema {
    Schema::new(
        vec![
            date("date", "Invoice Date").required(),
            FieldSpec::text("invoice_no", "Invoice No").required(),
            FieldSpec::text("eo_number", "EO Number"),
            FieldSpec::text("your_reference_no", "Your Reference No"),
            FieldSpec::text("our_reference_no", "Our Reference No"),
            FieldSpec::text("supplier_address", "Supplier Address"),
            FieldSpec::text("bill_to_address", "Bill To Address"),
            choice("country_of_origin", "Country of Origin", &["India", "USA", "China"]),
            choice(
                "port_of_embarkation",
                "Port of Embarkation",
                &["Nhava Sheva", "Mumbai", "Chennai"],
            ),
            choice(
                "port_of_discharge",
                "Port of Discharge",
                &["Los Angeles", "New York", "Chicago"],
            ),
            number("total_amount", "Total Amount (USD)"),
            number("receivable_amount", "Receivable Amount (50%)"),
            FieldSpec::text("receivable_amount_text", "Receivable Amount in Words"),
            number("received_amount", "Received Amount"),
            number("balance_amount", "Balance Amount"),
        ],
        vec![GroupSpec::new(
            "line_items",
            "Line Items",
            vec![
                FieldSpec::text("line_no", "Line No"),
                FieldSpec::text("part_number", "Part Number"),
                FieldSpec::text("description", "Description").required(),
                number("quantity", "Quantity").required(),
                number("unit_rate", "Unit Rate").required(),
                number("total", "Total"),
            ],
        )
        .required()],
    )
}

fn export_invoice_schema() -> Schema {
    let places = ["USA", "India", "Dubai"];
    let countries = ["India", "USA", "Dubai"];
    Schema::new(
        vec![
            FieldSpec::text("invoice_no", "Invoice No").required(),
            date("date", "Invoice Date").required(),
            FieldSpec::text("order_no", "Buyer's Order No"),
            date("order_date", "Buyer's Order Date"),
            FieldSpec::text("exporter_ref", "Exporter's Ref"),
            FieldSpec::text("iec", "IEC"),
            FieldSpec::text("tax_no", "Tax No"),
            FieldSpec::text("lut_arn_no", "LUT ARN No"),
            choice("terms", "Terms", &["Prepaid", "Postpaid"]),
            FieldSpec::text("port_loading", "Port of Loading"),
            FieldSpec::text("port_Discharge", "Port of Discharge"),
            FieldSpec::text("pre_carriage", "Pre-Carriage By"),
            FieldSpec::text("place_receipt", "Place of Receipt"),
            choice("port_destination", "Port of Destination", &places),
            choice("destination", "Destination", &places),
            choice("currency_sign", "Currency", &["INR (₹)", "USD ($)"]),
            choice("vessel_no", "Vessel", &["By Air", "By Ship", "By Road"]),
            choice("country", "Country of Origin", &countries),
            choice("final_destination", "Final Destination", &countries),
            FieldSpec::text("other_reference", "Other Reference"),
            FieldSpec::text("consignee_address", "Consignee Address").required(),
            FieldSpec::text("delivery", "Delivery Address"),
            FieldSpec::text("contact_details_name", "Contact Person Name"),
            FieldSpec::text("contact_details_email", "Contact Email"),
            number("total_export_value", "Total Export Value"),
            number("total_gst_value", "Total GST Value"),
            number("total_invoice_value", "Total Invoice Value"),
        ],
        vec![GroupSpec::new(
            "table",
            "Goods",
            vec![
                FieldSpec::text("range", "No./Range of Packages"),
                FieldSpec::text("description", "Description of Goods").required(),
                FieldSpec::text("unit", "Unit"),
                number("quantity", "Quantity").required(),
                number("rate", "Rate").required(),
                number("amount", "Amount"),
            ],
        )
        .required()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_from_str_aliases() {
        assert_eq!(
            "ZC/IN/07".parse::<DocumentFamily>().unwrap(),
            DocumentFamily::ExportInvoice
        );
        assert_eq!(
            "Packaging-List".parse::<DocumentFamily>().unwrap(),
            DocumentFamily::PackingList
        );
        assert_eq!(
            "proforma".parse::<DocumentFamily>().unwrap(),
            DocumentFamily::ProformaInvoice
        );
        assert!("waybill".parse::<DocumentFamily>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for family in DocumentFamily::ALL {
            assert_eq!(family.to_string().parse::<DocumentFamily>().unwrap(), family);
        }
    }

    #[test]
    fn test_output_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 15, 5, 0).unwrap();
        assert_eq!(
            DocumentFamily::PackingList.output_file_name(&at, "json"),
            "Packaging-List-16October2026-3.05pm.json"
        );

        let morning = Utc.with_ymd_and_hms(2026, 1, 2, 0, 30, 0).unwrap();
        assert_eq!(
            DocumentFamily::ExportInvoice.output_file_name(&morning, ".md"),
            "ZC-IN-07-2January2026-12.30am.md"
        );
    }

    #[test]
    fn test_group_keys_declared_in_schema() {
        for family in DocumentFamily::ALL {
            let schema = family.schema();
            assert!(schema.group(family.group_key()).is_some(), "{family}");
        }
    }

    #[test]
    fn test_prepare_computes_then_validates() {
        let record = DataRecord::from_json(serde_json::json!({
            "invoice_no": "PI-1",
            "date": "16-10-2026",
            "line_items": [{"description": "Valve", "quantity": "2", "unit_rate": "5"}]
        }))
        .unwrap();
        let prepared = DocumentFamily::ProformaInvoice.prepare(record).unwrap();
        assert_eq!(prepared.scalar("total_amount"), Some("10.00"));

        let bad = DataRecord::from_json(serde_json::json!({"invoice_no": "PI-2"})).unwrap();
        assert!(matches!(
            DocumentFamily::ProformaInvoice.prepare(bad),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&DocumentFamily::ProformaInvoice).unwrap();
        assert_eq!(json, r#""proforma_invoice""#);
    }
}
