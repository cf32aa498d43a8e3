use crate::domain::record::{RecordKind, ResultRecord};
use crate::error::{AppError, AppResult};
use serde_json::json;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

const SUMMARY_FILE: &str = "summary.txt";

/// Write the given (possibly filtered) records as one downloadable archive:
/// per record a numbered folder with the text, the decoded WAV audio and a
/// metadata file, plus a top-level summary listing total and per-kind counts.
pub fn write_archive<W: Write + Seek>(records: &[&ResultRecord], writer: W) -> AppResult<()> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default();

    for (index, record) in records.iter().enumerate() {
        let folder = folder_name(index, record);

        add_file(
            &mut zip,
            &format!("{}/text.txt", folder),
            record.display_text().as_bytes(),
            options,
        )?;
        add_file(
            &mut zip,
            &format!("{}/audio.wav", folder),
            record.audio_data(),
            options,
        )?;

        let metadata = metadata_for(record);
        let pretty = serde_json::to_vec_pretty(&metadata)
            .map_err(|e| AppError::Export(format!("cannot serialize metadata: {}", e)))?;
        add_file(&mut zip, &format!("{}/metadata.json", folder), &pretty, options)?;
    }

    add_file(&mut zip, SUMMARY_FILE, summary_for(records).as_bytes(), options)?;

    zip.finish()
        .map_err(|e| AppError::Export(format!("cannot finalize archive: {}", e)))?;
    tracing::info!(record_count = records.len(), "archive written");
    Ok(())
}

/// Write the archive to a file on disk.
pub fn export_to_file(records: &[&ResultRecord], path: &Path) -> AppResult<()> {
    let file = File::create(path)
        .map_err(|e| AppError::Export(format!("cannot create {}: {}", path.display(), e)))?;
    write_archive(records, file)
}

fn folder_name(index: usize, record: &ResultRecord) -> String {
    let kind = match record.kind() {
        RecordKind::SpeechGeneration => "speech_generation",
        RecordKind::SpeechRecognition => "speech_recognition",
    };
    format!("{:03}_{}", index + 1, kind)
}

fn metadata_for(record: &ResultRecord) -> serde_json::Value {
    match record {
        ResultRecord::SpeechGeneration(r) => json!({
            "kind": RecordKind::SpeechGeneration.as_str(),
            "id": r.id,
            "created_at": r.created_at.to_rfc3339(),
            "source_text": r.source_text,
        }),
        ResultRecord::SpeechRecognition(r) => json!({
            "kind": RecordKind::SpeechRecognition.as_str(),
            "id": r.id,
            "created_at": r.created_at.to_rfc3339(),
            "raw_transcription": r.raw_transcription,
            "cleaned_transcription": r.cleaned_transcription,
            "finish_reason": r.finish_reason,
            "usage_metadata": r.usage_metadata,
            "model_version": r.model_version,
            "confidence": r.confidence,
            "source_file_name": r.source_file_name,
        }),
    }
}

fn summary_for(records: &[&ResultRecord]) -> String {
    let generations = records
        .iter()
        .filter(|r| r.kind() == RecordKind::SpeechGeneration)
        .count();
    let recognitions = records.len() - generations;
    format!(
        "total: {}\nspeech-generation: {}\nspeech-recognition: {}\n",
        records.len(),
        generations,
        recognitions
    )
}

fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    contents: &[u8],
    options: FileOptions,
) -> AppResult<()> {
    zip.start_file(name, options)
        .map_err(|e| AppError::Export(format!("cannot add {}: {}", name, e)))?;
    zip.write_all(contents)
        .map_err(|e| AppError::Export(format!("cannot write {}: {}", name, e)))?;
    Ok(())
}
