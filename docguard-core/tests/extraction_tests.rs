//! Extraction dispatch and the review pipeline from raw bytes to report.

use docguard_core::{
    Category, ContentFormat, EngineConfig, ExtractionError, ExtractionService, Outcome,
    ReviewSession, ReviewStep, StepProfiler, SuggestionId,
};
use serde_json::Value;
use std::io::{Cursor, Write};

fn docx_bytes(document_xml: &str) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::FileOptions::default())
        .unwrap();
    zip.write_all(document_xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

const WORD_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>系统升级</w:t></w:r></w:p>
    <w:p><w:r><w:t>我们将按装新系统。</w:t></w:r></w:p>
    <w:p><w:r><w:t>水果有苹果、香蕉，和橙子。</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

mod extraction {
    use super::*;

    #[test]
    fn plain_text_strips_bom() {
        let bytes = "\u{feff}我们将按装新系统。".as_bytes();
        let doc = ExtractionService::new().extract(bytes, ".TXT").unwrap();
        assert_eq!(doc.format, ContentFormat::PlainText);
        assert_eq!(doc.content, "我们将按装新系统。");
        assert_eq!(doc.text_content, doc.content);
    }

    #[test]
    fn unsupported_extension_is_rejected_before_parsing() {
        let err = ExtractionService::new().extract(b"", "rtf").unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(ext) if ext == "rtf"));
    }

    #[test]
    fn empty_input_is_malformed() {
        let err = ExtractionService::new().extract(b"", "txt").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { .. }));
    }

    #[test]
    fn docx_renders_html_and_text() {
        let doc = ExtractionService::new()
            .extract(&docx_bytes(WORD_XML), "docx")
            .unwrap();
        assert_eq!(doc.format, ContentFormat::Html);
        assert!(doc.content.starts_with("<h2>系统升级</h2>"));
        assert!(doc.content.contains("<p>我们将按装新系统。</p>"));
        assert_eq!(doc.text_content, "系统升级\n我们将按装新系统。\n水果有苹果、香蕉，和橙子。");
    }

    #[test]
    fn legacy_doc_that_is_not_a_zip_is_malformed() {
        let err = ExtractionService::new()
            .extract(b"\xd0\xcf\x11\xe0 binary word", "doc")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { .. }));
    }

    #[test]
    fn garbage_pdf_is_malformed() {
        let err = ExtractionService::new()
            .extract(b"definitely not a pdf", "pdf")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { format, .. } if format == "pdf"));
    }

    #[test]
    fn invalid_utf8_text_is_malformed() {
        let err = ExtractionService::new().extract(&[0xff, 0xfe, 0x00], "txt").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { .. }));
    }
}

mod session {
    use super::*;

    fn open(bytes: &[u8], extension: &str) -> ReviewSession {
        let mut profiler = StepProfiler::new(false);
        ReviewSession::open(bytes, extension, "sample", EngineConfig::default(), &mut profiler).unwrap()
    }

    #[test]
    fn detects_and_adopts_in_text_document() {
        let text = "我们将按装新系统。\n水果有苹果、香蕉，和橙子。";
        let mut session = open(text.as_bytes(), "txt");

        let categories: Vec<Category> = session
            .engine()
            .suggestions()
            .iter()
            .map(|s| s.category)
            .collect();
        assert_eq!(categories, vec![Category::Typo, Category::Grammar]);

        let results = session.adopt_all().unwrap();
        assert!(results.iter().all(|r| r.outcome == Outcome::Replaced));
        assert_eq!(
            session.engine().document().to_plain_text(),
            "我们将安装新系统。\n水果有苹果、香蕉和橙子。"
        );
    }

    #[test]
    fn docx_session_keeps_headings() {
        let mut session = open(&docx_bytes(WORD_XML), "docx");
        session.adopt(SuggestionId(0)).unwrap();

        let html = session.engine().document().to_html();
        assert!(html.starts_with("<h2>系统升级</h2>"));
        assert!(html.contains("<p>我们将安装新系统。</p>"));
    }

    #[test]
    fn report_summarizes_adoption() {
        let mut session = open("我们将按装新系统。既使下雨。".as_bytes(), "txt");
        session.adopt(SuggestionId(1)).unwrap();

        let report: Value = serde_json::from_str(&session.report().to_json_pretty().unwrap()).unwrap();
        assert_eq!(report["schema_version"], docguard_core::SCHEMA_VERSION);
        assert_eq!(report["file_name"], "sample");
        assert_eq!(report["format"], "plaintext");
        assert_eq!(report["summary"]["total"], 2);
        assert_eq!(report["summary"]["adopted"], 1);
        assert_eq!(report["summary"]["by_category"]["错别字"], 2);
        assert_eq!(report["suggestions"][1]["adopted"], true);
        assert_eq!(report["text"], "我们将按装新系统。即使下雨。");
        assert_eq!(report["source_sha256"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn unsupported_upload_fails_to_open() {
        let mut profiler = StepProfiler::new(false);
        let result = ReviewSession::open(b"{}", "json", "x.json", EngineConfig::default(), &mut profiler);
        let err = result.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ExtractionError>(),
            Some(ExtractionError::Unsupported(_))
        ));
    }

    #[test]
    fn open_file_reads_and_fingerprints_from_disk() {
        let path = std::env::temp_dir().join(format!("docguard_open_{}.txt", std::process::id()));
        std::fs::write(&path, "我们将按装新系统。").unwrap();

        let mut profiler = StepProfiler::new(false);
        let session = ReviewSession::open_file(&path, EngineConfig::default(), &mut profiler).unwrap();
        let report = session.report();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(session.file_name(), path.file_name().unwrap().to_str().unwrap());
        assert_eq!(report.source_sha256, docguard_core::report::fingerprint("我们将按装新系统。".as_bytes()));
        assert_eq!(report.summary.total, 1);
    }

    #[test]
    fn profiled_review_reports_step_timings() {
        let mut profiler = StepProfiler::new(true);
        let mut session = ReviewSession::open(
            "我们将按装新系统。既使下雨。".as_bytes(),
            "txt",
            "sample",
            EngineConfig::default(),
            &mut profiler,
        )
        .unwrap();
        for id in [SuggestionId(0), SuggestionId(1)] {
            profiler.time_step(ReviewStep::Adoption, || session.adopt(id)).unwrap();
        }

        let timings = profiler.timings();
        let steps: Vec<ReviewStep> = timings.iter().map(|t| t.step).collect();
        assert_eq!(
            steps,
            vec![
                ReviewStep::Extraction,
                ReviewStep::DocumentTree,
                ReviewStep::Detection,
                ReviewStep::Catalog,
                ReviewStep::Adoption,
            ]
        );
        assert_eq!(timings.last().unwrap().runs, 2);

        let report: Value = serde_json::from_str(
            &session.report().with_timings(timings).to_json_pretty().unwrap(),
        )
        .unwrap();
        assert_eq!(report["timings"][0]["step"], "extraction");
        assert_eq!(report["timings"][4]["runs"], 2);
    }

    #[test]
    fn unprofiled_report_omits_timings() {
        let session = open("我们将按装新系统。".as_bytes(), "txt");
        let report: Value = serde_json::from_str(&session.report().to_json_pretty().unwrap()).unwrap();
        assert!(report.get("timings").is_none());
    }
}
