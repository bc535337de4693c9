//! Batch coordinator tests with fake converters. No external tools needed.

mod common;

use common::{config_in, entries, FakeConverter, Fakes};
use edgequake_doc2pdf::{
    convert_batch_with, convert_paths, Artifact, BatchProgressCallback, Category,
    ConversionConfig, Doc2PdfError, FileError, Strategy, Upload,
};
use std::io::Read;
use std::sync::{Arc, Mutex};

fn upload(name: &str) -> Upload {
    Upload::new(name, format!("content of {name}").into_bytes())
}

#[tokio::test]
async fn each_category_reaches_its_converter() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let uploads = vec![
        upload("letter.docx"),
        upload("deck.pptx"),
        upload("sheet.xlsx"),
        upload("readme.txt"),
        upload("photo.jpg"),
        upload("notes.md"),
        upload("scan.pdf"),
    ];
    let output = convert_batch_with(uploads, None, &dispatcher, &config)
        .await
        .unwrap();

    assert!(output.failures.is_empty(), "{:?}", output.failures);
    assert_eq!(output.stats.converted_files, 7);

    let office: Vec<Category> = fakes.office.calls().into_iter().map(|(_, c)| c).collect();
    assert_eq!(
        office,
        vec![
            Category::Word,
            Category::Powerpoint,
            Category::Excel,
            Category::Text,
            Category::Pdf
        ]
    );
    assert_eq!(
        fakes.pandoc.calls(),
        vec![("notes.md".to_string(), Category::Markdown)]
    );
    assert_eq!(
        fakes.image.calls(),
        vec![("photo.jpg".to_string(), Category::Image)]
    );

    let strategies: Vec<Strategy> = output.converted.iter().map(|c| c.strategy).collect();
    assert_eq!(strategies[4], Strategy::Image);
    assert_eq!(strategies[5], Strategy::Pandoc);
    assert!(output.converted[6].output.ends_with("_scan.docx"));
}

#[tokio::test]
async fn single_output_is_not_zipped() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let output = convert_batch_with(vec![upload("notes.md")], None, &dispatcher, &config)
        .await
        .unwrap();

    let Artifact::Single { path } = &output.artifact else {
        panic!("expected a single file, got {:?}", output.artifact);
    };
    assert_eq!(path.parent().unwrap(), config.output_dir);
    assert!(output.download_name().ends_with("_notes.pdf"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "pandoc:notes.md");
    assert_eq!(entries(&config.output_dir), 1);
}

#[tokio::test]
async fn several_outputs_are_zipped() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let uploads = vec![upload("a.docx"), upload("b.md"), upload("c.png")];
    let output = convert_batch_with(uploads, None, &dispatcher, &config)
        .await
        .unwrap();

    let Artifact::Archive { path, entries: n } = &output.artifact else {
        panic!("expected an archive, got {:?}", output.artifact);
    };
    assert_eq!(*n, 3);
    let name = output.download_name();
    assert!(name.starts_with("converted_") && name.ends_with(".zip"), "{name}");

    // Only the archive is published.
    assert_eq!(entries(&config.output_dir), 1);

    let mut zip = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    assert_eq!(zip.len(), 3);
    let mut names: Vec<String> = zip.file_names().map(|n| n.to_string()).collect();
    names.sort();
    assert!(names.iter().any(|n| n.ends_with("_a.pdf")), "{names:?}");
    assert!(names.iter().any(|n| n.ends_with("_b.pdf")), "{names:?}");
    assert!(names.iter().any(|n| n.ends_with("_c.pdf")), "{names:?}");

    let entry = names.iter().find(|n| n.ends_with("_b.pdf")).unwrap().clone();
    let mut body = String::new();
    zip.by_name(&entry).unwrap().read_to_string(&mut body).unwrap();
    assert_eq!(body, "pandoc:b.md");
}

#[tokio::test]
async fn one_failure_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes {
        office: FakeConverter::failing_on("office", "broken"),
        ..Fakes::new()
    };
    let dispatcher = fakes.dispatcher(&config);

    let uploads = vec![
        upload("broken.docx"),
        upload("virus.exe"),
        upload("fine.xlsx"),
        upload("notes.md"),
    ];
    let output = convert_batch_with(uploads, None, &dispatcher, &config)
        .await
        .unwrap();

    assert_eq!(output.stats.total_files, 4);
    assert_eq!(output.stats.converted_files, 2);
    assert_eq!(output.stats.failed_files, 2);
    assert!(output.artifact.is_archive());

    let messages: Vec<String> = output.failures.iter().map(|f| f.to_string()).collect();
    assert!(messages[0].starts_with("Conversion failed for broken.docx"));
    assert_eq!(messages[1], "Unsupported file type: virus.exe");

    // The office converter still saw the file after the failing one.
    assert_eq!(fakes.office.calls().len(), 2);
}

#[tokio::test]
async fn one_survivor_is_published_alone() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let uploads = vec![upload("archive.rar"), upload("deck.ppt")];
    let output = convert_batch_with(uploads, None, &dispatcher, &config)
        .await
        .unwrap();
    assert!(!output.artifact.is_archive());
    assert_eq!(output.failures.len(), 1);
}

#[tokio::test]
async fn all_failed_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes {
        pandoc: FakeConverter::failing_on("pandoc", ".md"),
        ..Fakes::new()
    };
    let dispatcher = fakes.dispatcher(&config);

    let err = convert_batch_with(
        vec![upload("a.md"), upload("b.zip")],
        None,
        &dispatcher,
        &config,
    )
    .await
    .unwrap_err();

    match err {
        Doc2PdfError::AllFilesFailed { total, failures } => {
            assert_eq!(total, 2);
            assert!(matches!(failures[0], FileError::ToolFailed { .. }));
            assert!(matches!(failures[1], FileError::Unsupported { .. }));
        }
        other => panic!("expected AllFilesFailed, got {other:?}"),
    }
    assert_eq!(entries(&config.output_dir), 0);
}

#[tokio::test]
async fn forced_type_must_match_extension() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let uploads = vec![upload("scan.pdf"), upload("report.docx")];
    let output = convert_batch_with(uploads, Some(Category::Pdf), &dispatcher, &config)
        .await
        .unwrap();

    assert_eq!(output.converted.len(), 1);
    assert_eq!(output.converted[0].category, Category::Pdf);
    assert_eq!(
        output.failures,
        vec![FileError::Unsupported {
            filename: "report.docx".into()
        }]
    );
    assert!(output.download_name().ends_with("_scan.docx"));
}

#[tokio::test]
async fn client_paths_are_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let output = convert_batch_with(
        vec![upload("../../etc/My Notes.md")],
        None,
        &dispatcher,
        &config,
    )
    .await
    .unwrap();

    assert_eq!(output.converted[0].source, "My_Notes.md");
    assert_eq!(output.artifact.path().parent().unwrap(), config.output_dir);
}

#[tokio::test]
async fn long_names_still_convert() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let uploads = vec![
        upload(&format!("{}.md", "a".repeat(230))),
        upload(&format!("{}.pdf", "b".repeat(300))),
    ];
    let output = convert_batch_with(uploads, None, &dispatcher, &config)
        .await
        .unwrap();

    assert!(output.failures.is_empty(), "{:?}", output.failures);
    assert_eq!(output.converted[0].category, Category::Markdown);
    assert!(output.converted[0].output.ends_with(".pdf"));
    assert_eq!(output.converted[1].category, Category::Pdf);
    assert!(output.converted[1].output.ends_with(".docx"));
}

#[tokio::test]
async fn hidden_style_names_are_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let output = convert_batch_with(
        vec![upload(".md"), upload("kept.md")],
        None,
        &dispatcher,
        &config,
    )
    .await
    .unwrap();

    assert_eq!(
        output.failures,
        vec![FileError::Unsupported {
            filename: "md".into()
        }]
    );
    assert_eq!(fakes.pandoc.calls().len(), 1);
}

#[tokio::test]
async fn staging_area_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes {
        image: FakeConverter::failing_on("image", "bad"),
        ..Fakes::new()
    };
    let dispatcher = fakes.dispatcher(&config);

    convert_batch_with(
        vec![upload("a.txt"), upload("b.txt")],
        None,
        &dispatcher,
        &config,
    )
    .await
    .unwrap();
    assert_eq!(entries(&config.upload_dir), 0);

    convert_batch_with(vec![upload("bad.png")], None, &dispatcher, &config)
        .await
        .unwrap_err();
    assert_eq!(entries(&config.upload_dir), 0);
}

#[tokio::test]
async fn convert_paths_reads_local_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    let input = dir.path().join("chapter.md");
    std::fs::write(&input, "# Chapter").unwrap();

    let output = convert_paths(&[input], None, &dispatcher, &config)
        .await
        .unwrap();
    assert_eq!(output.converted[0].source, "chapter.md");

    let err = convert_paths(&[dir.path().join("missing.md")], None, &dispatcher, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Doc2PdfError::InputReadFailed { .. }));
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl BatchProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.events.lock().unwrap().push(format!("start {total_files}"));
    }
    fn on_file_start(&self, index: usize, _total: usize, filename: &str) {
        self.events.lock().unwrap().push(format!("file {index} {filename}"));
    }
    fn on_file_complete(&self, index: usize, _total: usize, _filename: &str) {
        self.events.lock().unwrap().push(format!("ok {index}"));
    }
    fn on_file_error(&self, index: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("err {index}"));
    }
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {success_count}/{total_files}"));
    }
}

#[tokio::test]
async fn progress_events_follow_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Arc::new(RecordingCallback::default());
    let config = ConversionConfig::builder()
        .upload_dir(dir.path().join("uploads"))
        .output_dir(dir.path().join("outputs"))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let fakes = Fakes::new();
    let dispatcher = fakes.dispatcher(&config);

    convert_batch_with(
        vec![upload("a.md"), upload("b.odt")],
        None,
        &dispatcher,
        &config,
    )
    .await
    .unwrap();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "start 2",
            "file 1 a.md",
            "ok 1",
            "file 2 b.odt",
            "err 2",
            "done 1/2"
        ]
    );
}
