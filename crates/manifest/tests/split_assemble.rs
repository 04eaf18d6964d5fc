use homemap_manifest::{
    split_file, LocalPartFetcher, ManifestAssembler, ManifestError, SourceLocation,
};
use std::sync::Arc;
use tempfile::TempDir;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[tokio::test]
async fn split_then_assemble_reproduces_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("home.index.bin");
    let data = payload(10_000);
    std::fs::write(&input, &data).expect("write input");
    let out_dir = temp.path().join("data");

    let descriptor = split_file(&input, &out_dir, "home.index.bin", 1_024).expect("split");
    assert_eq!(descriptor.parts().len(), 10);

    let location: SourceLocation = out_dir.to_string_lossy().parse().expect("location");
    let assembler = ManifestAssembler::new(location.fetcher().expect("fetcher"));
    let assembled = assembler.assemble("home.index.bin").await.expect("assemble");

    assert_eq!(assembled, data);
}

#[tokio::test]
async fn deleted_part_fails_whole_assembly() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("blob");
    std::fs::write(&input, payload(300)).expect("write input");

    split_file(&input, temp.path(), "blob", 100).expect("split");
    std::fs::remove_file(temp.path().join("blob.part_01")).expect("remove part");

    let assembler = ManifestAssembler::new(Arc::new(LocalPartFetcher::new(temp.path())));
    let err = assembler.assemble("blob").await.expect_err("must fail");
    match err {
        ManifestError::PartFetchFailed { part, .. } => assert_eq!(part, "blob.part_01"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn truncated_part_is_caught_by_total_size() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("blob");
    std::fs::write(&input, payload(250)).expect("write input");

    split_file(&input, temp.path(), "blob", 100).expect("split");
    std::fs::write(temp.path().join("blob.part_02"), b"short").expect("truncate part");

    let assembler = ManifestAssembler::new(Arc::new(LocalPartFetcher::new(temp.path())));
    let err = assembler.assemble("blob").await.expect_err("must fail");
    assert!(matches!(err, ManifestError::MalformedManifest { .. }));
}
