pub mod pdf_printer;

pub use pdf_printer::PdfPrinter;
