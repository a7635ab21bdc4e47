#![allow(missing_docs)]

use treebin::{
    ByteBuffer, FileBacked, LoadPolicy, Sequence, Transfer, TreeBin, TreeBinError,
};

#[derive(Default, Debug, Clone, PartialEq, Transfer)]
struct History {
    model: String,
    temperature: f64,
    turns: Sequence<String>,
    avatar: ByteBuffer,
}

fn history() -> History {
    History {
        model: "small".into(),
        temperature: 0.5,
        turns: vec!["hi".to_string()].into(),
        avatar: ByteBuffer::from(vec![7u8; 16]),
    }
}

// --- TESTS ---

#[test]
fn test_flush_on_release() -> treebin::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| TreeBinError::file_access("tmp", e))?;
    let path = dir.path().join("history.tb");
    TreeBin::save(&path, &history())?;

    {
        let mut backed = FileBacked::<History>::open(&path)?;
        assert_eq!(*backed, history());
        backed.turns.push("how are you?".into());
        backed.avatar.data.truncate(4);
    }

    let reloaded: History = TreeBin::load(&path)?;
    assert_eq!(reloaded.turns.len(), 2);
    assert_eq!(reloaded.turns[1], "how are you?");
    assert_eq!(reloaded.avatar.data, vec![7u8; 4]);
    Ok(())
}

#[test]
fn test_flush_happens_even_after_manual_flush() -> treebin::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| TreeBinError::file_access("tmp", e))?;
    let path = dir.path().join("history.tb");
    TreeBin::save(&path, &history())?;

    {
        let mut backed = FileBacked::<History>::open(&path)?;
        backed.model = "first".into();
        backed.flush()?;
        assert_eq!(TreeBin::load::<History, _>(&path)?.model, "first");
        backed.model = "second".into();
    }

    assert_eq!(TreeBin::load::<History, _>(&path)?.model, "second");
    Ok(())
}

#[test]
fn test_close_propagates_and_persists() -> treebin::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| TreeBinError::file_access("tmp", e))?;
    let path = dir.path().join("history.tb");
    TreeBin::save(&path, &history())?;

    let mut backed = FileBacked::<History>::open(&path)?;
    backed.set(History::default());
    assert_eq!(backed.path(), path.as_path());
    backed.close()?;

    assert_eq!(TreeBin::load::<History, _>(&path)?, History::default());
    Ok(())
}

#[test]
fn test_missing_file_fails_without_creating_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.tb");

    let err = FileBacked::<History>::open(&path).expect_err("file does not exist");
    assert!(err.is_not_found());
    assert!(!path.exists());
}

#[test]
fn test_failed_load_does_not_overwrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("partial.tb");

    // `turns` is missing, so the load fails half way through.
    let original = b"{\"model\": \"kept\", \"temperature\": 1.0}\0".to_vec();
    std::fs::write(&path, &original).expect("write");

    let err = FileBacked::<History>::open(&path).expect_err("turns missing");
    assert!(matches!(err, TreeBinError::MissingField { ref key, .. } if key == "turns"));
    assert_eq!(std::fs::read(&path).expect("read back"), original);
}

#[test]
fn test_unwritable_value_keeps_previous_file() -> treebin::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| TreeBinError::file_access("tmp", e))?;
    let path = dir.path().join("history.tb");
    TreeBin::save(&path, &history())?;
    let before = std::fs::read(&path).map_err(|e| TreeBinError::file_access(&path, e))?;

    let mut backed = FileBacked::<History>::open(&path)?;
    backed.temperature = f64::NAN;
    let err = backed.close().expect_err("NaN cannot be stored");
    assert!(matches!(err, TreeBinError::TypeMismatch { ref key, .. } if key == "temperature"));

    let after = std::fs::read(&path).map_err(|e| TreeBinError::file_access(&path, e))?;
    assert_eq!(before, after);
    assert_eq!(TreeBin::load::<History, _>(&path)?, history());
    Ok(())
}

#[test]
fn test_open_or_default_creates_on_release() -> treebin::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| TreeBinError::file_access("tmp", e))?;
    let path = dir.path().join("fresh.tb");

    {
        let mut backed = FileBacked::<History>::open_or_default(&path)?;
        assert_eq!(*backed, History::default());
        backed.model = "created".into();
    }

    assert_eq!(TreeBin::load::<History, _>(&path)?.model, "created");
    Ok(())
}

#[test]
fn test_open_with_options() -> treebin::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| TreeBinError::file_access("tmp", e))?;
    let path = dir.path().join("compact.tb");
    let opts = TreeBin::builder()
        .compact()
        .load_policy(LoadPolicy::DefaultIfMissing);

    FileBacked::<History>::open_with(&path, opts)?.close()?;

    let bytes = std::fs::read(&path).map_err(|e| TreeBinError::file_access(&path, e))?;
    assert!(!bytes.contains(&b'\n'));
    Ok(())
}

#[test]
fn test_scoped_access_flushes_on_error() -> treebin::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| TreeBinError::file_access("tmp", e))?;
    let path = dir.path().join("history.tb");
    TreeBin::save(&path, &history())?;

    let res: treebin::Result<()> = FileBacked::<History>::with(&path, |h| {
        h.model = "mutated".into();
        Err(TreeBinError::Format("caller gave up".into()))
    });
    assert!(matches!(res, Err(TreeBinError::Format(ref m)) if m == "caller gave up"));
    assert_eq!(TreeBin::load::<History, _>(&path)?.model, "mutated");

    let turns = FileBacked::<History>::with(&path, |h| Ok(h.turns.len()))?;
    assert_eq!(turns, 1);
    Ok(())
}

#[test]
fn test_from_value_writes_on_release() -> treebin::Result<()> {
    let dir = tempfile::tempdir().map_err(|e| TreeBinError::file_access("tmp", e))?;
    let path = dir.path().join("new.tb");

    drop(FileBacked::from_value(&path, history()));

    assert_eq!(TreeBin::load::<History, _>(&path)?, history());
    Ok(())
}
