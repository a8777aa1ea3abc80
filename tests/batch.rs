mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;

use transdoc::config::{Config, ConvertConfig};
use transdoc::convert::ConverterFactory;
use transdoc::progress::NoopObserver;
use transdoc::workflow::{TranslateOptions, Workflow};

use common::{docx, paragraph, tagging};

fn options(output: Option<&TempDir>) -> TranslateOptions {
    let mut config = Config::default();
    config.translate.target_language = "es".to_string();
    config.output.directory = output.map(|dir| dir.path().join("out"));
    TranslateOptions::from_config(&config)
}

#[test]
fn directory_run_continues_past_broken_files() {
    let input = TempDir::new().unwrap();
    input.child("a.txt").write_str("Hello.").unwrap();
    input.child("nested").create_dir_all().unwrap();
    input.child("nested/b.txt").write_str("Bye.\n").unwrap();
    input
        .child("c.docx")
        .write_binary(&docx(&paragraph(&["Word file."])))
        .unwrap();
    input.child("broken.docx").write_str("not a package").unwrap();
    input.child("photo.jpg").write_binary(&[0xff, 0xd8]).unwrap();

    let (translator, log) = tagging();
    let mut workflow = Workflow::new(
        translator,
        ConverterFactory::create_converter(&ConvertConfig::default()),
    );

    let batch = tokio_test::block_on(workflow.translate_directory(
        input.path(),
        &options(None),
        &mut NoopObserver,
    ))
    .unwrap();

    assert_eq!(batch.completed.len(), 3);
    assert_eq!(batch.failed.len(), 1);
    assert!(batch.failed[0].0.ends_with("broken.docx"));
    assert_eq!(log.calls().len(), 3);

    // Outputs land next to their inputs
    input.child("translated_a_es.txt").assert("[es] Hello.");
    input.child("nested/translated_b_es.txt").assert("[es] Bye.\n");
    assert!(input.child("translated_c_es.docx").path().is_file());
}

#[test]
fn second_run_does_not_translate_outputs() {
    let input = TempDir::new().unwrap();
    input.child("a.txt").write_str("Hello.").unwrap();

    let (translator, log) = tagging();
    let mut workflow = Workflow::new(
        translator,
        ConverterFactory::create_converter(&ConvertConfig::default()),
    );

    for _ in 0..2 {
        tokio_test::block_on(workflow.translate_directory(
            input.path(),
            &options(None),
            &mut NoopObserver,
        ))
        .unwrap();
    }

    assert_eq!(log.calls(), vec!["Hello.", "Hello."]);
    input.child("translated_a_es.txt").assert("[es] Hello.");
}

#[tokio::test]
async fn output_directory_is_created() {
    let input = TempDir::new().unwrap();
    input.child("a.txt").write_str("Hello.").unwrap();

    let (translator, _) = tagging();
    let mut workflow = Workflow::new(
        translator,
        ConverterFactory::create_converter(&ConvertConfig::default()),
    );

    let run = workflow
        .translate_file(
            &input.path().join("a.txt"),
            None,
            &options(Some(&input)),
            &mut NoopObserver,
        )
        .await
        .unwrap();

    assert_eq!(run.output_path, input.path().join("out").join("translated_a_es.txt"));
    input.child("out/translated_a_es.txt").assert("[es] Hello.");
}

#[tokio::test]
async fn missing_directory_is_an_error() {
    let input = TempDir::new().unwrap();
    let (translator, _) = tagging();
    let mut workflow = Workflow::new(
        translator,
        ConverterFactory::create_converter(&ConvertConfig::default()),
    );

    let result = workflow
        .translate_directory(&input.path().join("absent"), &options(None), &mut NoopObserver)
        .await;
    assert!(result.is_err());
}
