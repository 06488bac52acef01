// Packing the charts of a batch run.

use std::fs::File;
use std::io::Write;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::survey::*;

/// Name of the directory of a batch run: the local time, to the second.
pub fn batch_directory_name() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Zips all the files of a directory into `<dir>.zip`, then removes the directory.
pub fn archive_directory(dir: &Path) -> SurveyResult<PathBuf> {
    let dir_str = dir.display().to_string();
    let zip_path = PathBuf::from(format!("{}.zip", dir_str));
    let zip_str = zip_path.display().to_string();

    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .context(OpeningFileSnafu { path: dir_str.clone() })?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    entries.sort();
    debug!("archive_directory: {} files in {:?}", entries.len(), dir);

    let file = File::create(&zip_path).context(CreatingFileSnafu { path: zip_str.clone() })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for p in entries.iter() {
        let name = p
            .file_name()
            .and_then(|n| n.to_str())
            .context(ArchivingNameSnafu { path: p.display().to_string() })?;
        let content = fs::read(p).context(OpeningFileSnafu { path: p.display().to_string() })?;
        zip.start_file(name, options)
            .context(ArchivingSnafu { path: zip_str.clone() })?;
        zip.write_all(&content)
            .context(CreatingFileSnafu { path: zip_str.clone() })?;
    }
    zip.finish().context(ArchivingSnafu { path: zip_str.clone() })?;

    fs::remove_dir_all(dir).context(CreatingFileSnafu { path: dir_str })?;
    info!("Archived {} charts to {}", entries.len(), zip_str);
    Ok(zip_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_and_remove() {
        let dir = std::env::temp_dir().join(format!("surveytab_archive_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("1_2_custom_sorted.svg"), "<svg/>").unwrap();
        fs::write(dir.join("1_2_sorted_by_occurrence.svg"), "<svg/>").unwrap();

        let zip_path = archive_directory(&dir).unwrap();
        assert!(!dir.exists());
        let archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        fs::remove_file(&zip_path).unwrap();
    }

    #[test]
    fn directory_name() {
        let name = batch_directory_name();
        assert_eq!(name.len(), "2021-01-01 10:00:00".len());
        assert!(!name.contains('.'));
    }
}
