//! Document assembly for one dataset
//!
//! For every logical document, in canonical order: resolve the
//! template, reuse cached conversions, render once for the kinds that
//! missed, and convert those through the engine. Then write the
//! `html/`, `pdf/` and `docx/` collections, the combined PDF and the
//! job archive.
//!
//! Failures are recorded per (document, kind) and never stop the
//! remaining documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use billgen_data::BillingDataset;
use billgen_engine::{CacheKey, CacheStore, ConversionEngine, ConversionResult, MediaKind};
use billgen_ooxml::PartArchive;
use billgen_pdf::merge_pdfs;

use crate::document::{LogicalDocument, COMBINED_TITLE};
use crate::error::ErrorClass;
use crate::renderer::ContentRenderer;
use crate::report::{JobError, ProducedOutput};
use crate::template::TemplateRegistry;

/// Everything one assembly produced
#[derive(Debug, Default)]
pub struct Assembly {
    /// Written outputs, in canonical document order then media kind
    pub outputs: Vec<ProducedOutput>,
    pub errors: Vec<JobError>,
    pub combined_pdf: Option<PathBuf>,
    pub archive: Option<PathBuf>,
    /// Bytes of all written documents including the combined PDF
    pub total_bytes: u64,
}

/// Accepted conversion awaiting output
struct Piece {
    document: LogicalDocument,
    result: Arc<ConversionResult>,
    cached: bool,
}

/// Builds all outputs of one dataset
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    engine: Arc<ConversionEngine>,
    cache: Arc<CacheStore>,
    templates: Arc<TemplateRegistry>,
    renderer: ContentRenderer,
}

impl DocumentAssembler {
    pub fn new(
        engine: Arc<ConversionEngine>,
        cache: Arc<CacheStore>,
        templates: Arc<TemplateRegistry>,
    ) -> Self {
        Self {
            engine,
            cache,
            templates,
            renderer: ContentRenderer::new(),
        }
    }

    pub fn engine(&self) -> &ConversionEngine {
        &self.engine
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Produce every document of `dataset` under `out_dir`
    ///
    /// The archive is written to `<out_dir>/<stem>.zip`.
    pub fn assemble(&self, dataset: &BillingDataset, stem: &str, out_dir: &Path) -> Assembly {
        let mut assembly = Assembly::default();
        if let Err(e) = clear_previous(out_dir, stem) {
            assembly.errors.push(JobError::new(
                ErrorClass::Output,
                format!("cannot clear previous outputs in {}: {}", out_dir.display(), e),
            ));
        }
        let pieces = self.convert_all(dataset, &mut assembly.errors);

        if pieces.is_empty() {
            tracing::warn!(stem, "No document produced");
            return assembly;
        }

        let mut archive = PartArchive::new();
        self.write_pieces(&pieces, out_dir, &mut archive, &mut assembly);
        self.write_combined(&pieces, out_dir, &mut archive, &mut assembly);

        let archive_path = out_dir.join(format!("{}.zip", stem));
        match archive.write_to_file(&archive_path) {
            Ok(()) => assembly.archive = Some(archive_path),
            Err(e) => assembly.errors.push(JobError::new(
                ErrorClass::Output,
                format!("cannot write {}: {}", archive_path.display(), e),
            )),
        }

        assembly
    }

    /// Resolve, render and convert every (document, kind) pair
    fn convert_all(&self, dataset: &BillingDataset, errors: &mut Vec<JobError>) -> Vec<Piece> {
        let dataset_hash = dataset.content_hash();
        let mut pieces = Vec::new();

        for document in LogicalDocument::ALL {
            let resolved = match self.templates.resolve(document) {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::warn!(document = document.id(), "{}", e);
                    errors.push(JobError::new(e.class(), e.to_string()).for_document(document));
                    continue;
                }
            };

            let mut missed = Vec::new();
            for &kind in MediaKind::all() {
                let key = CacheKey::new(&dataset_hash, document.id(), kind, &resolved.version);
                match self.cache.get(&key) {
                    Some(result) => {
                        tracing::debug!(document = document.id(), %kind, "Cache hit");
                        pieces.push(Piece {
                            document,
                            result,
                            cached: true,
                        });
                    }
                    None => missed.push((kind, key)),
                }
            }
            if missed.is_empty() {
                continue;
            }

            let content = match self.renderer.render(dataset, document, &resolved.template) {
                Ok(content) => Arc::new(content),
                Err(e) => {
                    tracing::warn!(document = document.id(), "{}", e);
                    errors.push(JobError::new(e.class(), e.to_string()).for_document(document));
                    continue;
                }
            };

            for (kind, key) in missed {
                match self.engine.convert(&content, kind) {
                    Ok(result) => {
                        tracing::debug!(
                            document = document.id(),
                            %kind,
                            backend = %result.backend,
                            bytes = result.len(),
                            "Converted"
                        );
                        let result = Arc::new(result);
                        self.cache.put(key, Arc::clone(&result));
                        pieces.push(Piece {
                            document,
                            result,
                            cached: false,
                        });
                    }
                    Err(exhausted) => {
                        tracing::warn!(document = document.id(), %kind, "{}", exhausted);
                        errors.push(
                            JobError::new(ErrorClass::ConversionExhausted, exhausted.to_string())
                                .for_document(document)
                                .for_kind(kind),
                        );
                    }
                }
            }
        }

        // Cache hits and conversions interleave; restore canonical order
        pieces.sort_by_key(|p| (p.document, p.result.kind));
        pieces
    }

    fn write_pieces(
        &self,
        pieces: &[Piece],
        out_dir: &Path,
        archive: &mut PartArchive,
        assembly: &mut Assembly,
    ) {
        for piece in pieces {
            let kind = piece.result.kind;
            let file_name = format!("{}.{}", piece.document.title(), kind.extension());
            let path = out_dir.join(kind.collection()).join(&file_name);

            if let Err(e) = write_file(&path, &piece.result.data) {
                assembly.errors.push(
                    JobError::new(
                        ErrorClass::Output,
                        format!("cannot write {}: {}", path.display(), e),
                    )
                    .for_document(piece.document)
                    .for_kind(kind),
                );
                continue;
            }

            let entry = format!("{}/{}", kind.collection(), file_name);
            if let Err(e) = archive.set(entry, piece.result.data.clone()) {
                assembly.errors.push(
                    JobError::new(ErrorClass::Output, e.to_string())
                        .for_document(piece.document)
                        .for_kind(kind),
                );
            }

            assembly.total_bytes += piece.result.len() as u64;
            assembly.outputs.push(ProducedOutput {
                document: piece.document,
                kind,
                backend: piece.result.backend.clone(),
                bytes: piece.result.len(),
                path,
                cached: piece.cached,
            });
        }
    }

    /// Merge all PDFs, already in canonical order, into the combined bill
    fn write_combined(
        &self,
        pieces: &[Piece],
        out_dir: &Path,
        archive: &mut PartArchive,
        assembly: &mut Assembly,
    ) {
        let pdfs: Vec<&[u8]> = pieces
            .iter()
            .filter(|p| p.result.kind == MediaKind::Paginated)
            .map(|p| p.result.data.as_slice())
            .collect();
        if pdfs.is_empty() {
            return;
        }

        let merged = match merge_pdfs(&pdfs) {
            Ok(merged) => merged,
            Err(e) => {
                tracing::warn!("Combined PDF failed: {}", e);
                assembly.errors.push(
                    JobError::new(ErrorClass::Merge, e.to_string()).for_kind(MediaKind::Paginated),
                );
                return;
            }
        };

        let file_name = format!("{}.pdf", COMBINED_TITLE);
        let path = out_dir
            .join(MediaKind::Paginated.collection())
            .join(&file_name);
        if let Err(e) = write_file(&path, &merged) {
            assembly.errors.push(
                JobError::new(
                    ErrorClass::Output,
                    format!("cannot write {}: {}", path.display(), e),
                )
                .for_kind(MediaKind::Paginated),
            );
            return;
        }

        assembly.total_bytes += merged.len() as u64;
        let entry = format!("{}/{}", MediaKind::Paginated.collection(), file_name);
        if let Err(e) = archive.set(entry, merged) {
            assembly
                .errors
                .push(JobError::new(ErrorClass::Output, e.to_string()).for_kind(MediaKind::Paginated));
        }
        assembly.combined_pdf = Some(path);
    }
}

/// Remove the collections and archive a previous run left in `out_dir`
fn clear_previous(out_dir: &Path, stem: &str) -> std::io::Result<()> {
    for &kind in MediaKind::all() {
        let collection = out_dir.join(kind.collection());
        if collection.is_dir() {
            fs::remove_dir_all(&collection)?;
        }
    }
    let archive = out_dir.join(format!("{}.zip", stem));
    if archive.is_file() {
        fs::remove_file(&archive)?;
    }
    Ok(())
}

fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::build_engine;
    use crate::config::Settings;
    use billgen_data::{LineItem, TitleMeta};
    use tempfile::TempDir;

    fn sample_dataset() -> BillingDataset {
        BillingDataset {
            title: TitleMeta {
                project_name: Some("Drain construction".to_string()),
                agency: Some("M/s Civil Works".to_string()),
                agreement_no: Some("AG-3".to_string()),
                work_order_no: Some("WO-11".to_string()),
                bill_number: Some("First".to_string()),
                measurement_date: Some("2024-05-02".to_string()),
                ..Default::default()
            },
            work_order: vec![
                LineItem::new("1", "Excavation")
                    .with_unit("cum")
                    .with_quantities(5.0, 5.0)
                    .with_work_order_qty(6.0)
                    .with_rate(120.0),
                LineItem::new("2", "PCC")
                    .with_unit("cum")
                    .with_quantities(1.0, 1.0)
                    .with_work_order_qty(1.0)
                    .with_rate(4500.0),
            ],
            extra_items: vec![LineItem::new("E1", "Dewatering").with_quantities(1.0, 1.0)],
        }
    }

    fn assembler() -> DocumentAssembler {
        let mut settings = Settings::default();
        settings.engines.paginated = vec!["simple".to_string()];
        DocumentAssembler::new(
            Arc::new(build_engine(&settings, true).unwrap()),
            Arc::new(CacheStore::with_capacity(64).unwrap()),
            Arc::new(TemplateRegistry::builtin()),
        )
    }

    #[test]
    fn test_full_assembly_layout() {
        let out = TempDir::new().unwrap();
        let assembly = assembler().assemble(&sample_dataset(), "bill", out.path());

        assert!(assembly.errors.is_empty(), "{:?}", assembly.errors);
        assert_eq!(assembly.outputs.len(), 18);
        for document in LogicalDocument::ALL {
            for &kind in MediaKind::all() {
                let path = out
                    .path()
                    .join(kind.collection())
                    .join(format!("{}.{}", document.title(), kind.extension()));
                assert!(path.is_file(), "missing {}", path.display());
            }
        }
        assert_eq!(
            assembly.combined_pdf,
            Some(out.path().join("pdf").join("Combined Bill.pdf"))
        );

        let archive = PartArchive::open(out.path().join("bill.zip")).unwrap();
        assert_eq!(archive.len(), 19);
        assert!(archive.contains("pdf/Combined Bill.pdf"));
        assert!(archive.contains("docx/Certificate II.docx"));
        assert!(archive.contains("html/Scrutiny Sheet.html"));
    }

    #[test]
    fn test_outputs_in_canonical_order() {
        let out = TempDir::new().unwrap();
        let assembly = assembler().assemble(&sample_dataset(), "bill", out.path());
        let order: Vec<LogicalDocument> = assembly
            .outputs
            .iter()
            .filter(|o| o.kind == MediaKind::Paginated)
            .map(|o| o.document)
            .collect();
        assert_eq!(order, LogicalDocument::ALL.to_vec());
    }

    #[test]
    fn test_second_run_hits_cache() {
        let assembler = assembler();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let a = assembler.assemble(&sample_dataset(), "bill", first.path());
        assert_eq!(a.outputs.iter().filter(|o| o.cached).count(), 0);

        let b = assembler.assemble(&sample_dataset(), "bill", second.path());
        assert_eq!(b.outputs.iter().filter(|o| o.cached).count(), 18);
        assert_eq!(
            fs::read(first.path().join("pdf/Summary.pdf")).unwrap(),
            fs::read(second.path().join("pdf/Summary.pdf")).unwrap()
        );
    }

    #[test]
    fn test_changed_dataset_misses_cache() {
        let assembler = assembler();
        let out = TempDir::new().unwrap();
        assembler.assemble(&sample_dataset(), "bill", out.path());

        let mut changed = sample_dataset();
        changed.title.bill_number = Some("Second".to_string());
        let again = assembler.assemble(&changed, "bill", out.path());
        assert!(again.outputs.iter().all(|o| !o.cached));
    }

    #[test]
    fn test_data_shape_error_per_document() {
        let mut dataset = sample_dataset();
        dataset.title.measurement_date = None;
        let out = TempDir::new().unwrap();
        let assembly = assembler().assemble(&dataset, "bill", out.path());

        assert_eq!(assembly.errors.len(), 1);
        let err = &assembly.errors[0];
        assert_eq!(err.class, ErrorClass::DataShape);
        assert_eq!(err.document, Some(LogicalDocument::CertificateI));
        assert_eq!(assembly.outputs.len(), 15);
        assert!(!out.path().join("pdf/Certificate I.pdf").exists());
        assert!(assembly.combined_pdf.is_some());
    }

    #[test]
    fn test_nothing_produced_writes_nothing() {
        let mut dataset = sample_dataset();
        dataset.title.project_name = None;
        let out = TempDir::new().unwrap();
        let assembly = assembler().assemble(&dataset, "bill", out.path());

        assert_eq!(assembly.errors.len(), 6);
        assert!(assembly.outputs.is_empty());
        assert!(assembly.archive.is_none());
        assert!(!out.path().join("bill.zip").exists());
    }

    #[test]
    fn test_rerun_removes_outputs_of_failing_document() {
        let assembler = assembler();
        let out = TempDir::new().unwrap();
        assembler.assemble(&sample_dataset(), "bill", out.path());
        assert!(out.path().join("pdf/Certificate I.pdf").is_file());

        let mut dataset = sample_dataset();
        dataset.title.measurement_date = None;
        let again = assembler.assemble(&dataset, "bill", out.path());

        assert_eq!(again.errors.len(), 1);
        for &kind in MediaKind::all() {
            let stale = out
                .path()
                .join(kind.collection())
                .join(format!("Certificate I.{}", kind.extension()));
            assert!(!stale.exists(), "{} left behind", stale.display());
        }
        let archive = PartArchive::open(out.path().join("bill.zip")).unwrap();
        assert_eq!(archive.len(), 16);
        assert!(!archive.contains("pdf/Certificate I.pdf"));
    }

    #[test]
    fn test_rerun_with_nothing_produced_clears_archive() {
        let assembler = assembler();
        let out = TempDir::new().unwrap();
        assembler.assemble(&sample_dataset(), "bill", out.path());

        let mut dataset = sample_dataset();
        dataset.title.project_name = None;
        let again = assembler.assemble(&dataset, "bill", out.path());

        assert!(again.archive.is_none());
        assert!(!out.path().join("bill.zip").exists());
        assert!(!out.path().join("pdf").exists());
    }
}
