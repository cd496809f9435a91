//! Iterative depth-first walker over a remote directory tree
//!
//! Emulates os.walk against a live remote session without native
//! recursion: an explicit heap-resident stack of remaining-sibling
//! frames bounds depth by available memory, never by the call stack.
//! The session's current-directory cursor and the stack move in
//! lockstep - every descent pushes exactly one frame and every ascent
//! pops one, so after the walk ends the cursor is back at the
//! starting path.

use crate::error::Result;
use crate::listing::{parse_listing, ListingEntry};
use crate::session::RemoteSession;

/// One visited directory: its remote path and immediate contents
#[derive(Debug, Clone)]
pub struct WalkRecord {
    pub path: String,
    pub dirs: Vec<ListingEntry>,
    pub files: Vec<ListingEntry>,
}

/// Explicit-stack traversal state.
///
/// `next_dir` borrows the session per call, so between calls the
/// caller may issue its own commands against the yielded directory -
/// the cursor stays parked there until the walk is advanced.
pub struct Walker {
    start: String,
    /// Siblings of the current directory still to visit
    siblings: Vec<String>,
    /// One frame of remaining siblings per level below `start`
    stack: Vec<Vec<String>>,
    entered: bool,
    done: bool,
}

impl Walker {
    pub fn new(starting_path: impl Into<String>) -> Self {
        Self {
            start: starting_path.into(),
            siblings: Vec::new(),
            stack: Vec::new(),
            entered: false,
            done: false,
        }
    }

    /// Current depth below the starting path.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Advance to the next directory in depth-first pre-order and list
    /// it. Returns `None` once the tree is exhausted. Any session or
    /// parse failure ends the walk permanently; retry and skip policy
    /// belongs to the caller.
    pub fn next_dir<S: RemoteSession>(&mut self, session: &mut S) -> Option<Result<WalkRecord>> {
        if self.done {
            return None;
        }
        match self.advance(session) {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    fn advance<S: RemoteSession>(&mut self, session: &mut S) -> Result<Option<WalkRecord>> {
        if !self.entered {
            session.change_dir(&self.start)?;
            self.entered = true;
        } else {
            // Move the cursor off the directory yielded last call:
            // descend into its last-listed subdirectory (LIFO, so
            // sibling order is the reverse of listing order), or pop
            // frames - one `up` each - until a level with remaining
            // siblings is found.
            loop {
                if let Some(next) = self.siblings.pop() {
                    session.change_dir(&next)?;
                    self.stack.push(std::mem::take(&mut self.siblings));
                    break;
                }
                match self.stack.pop() {
                    Some(frame) => {
                        session.up()?;
                        self.siblings = frame;
                    }
                    None => {
                        self.done = true;
                        return Ok(None);
                    }
                }
            }
        }

        let lines = session.list_dir()?;
        let (dirs, files) = parse_listing(&lines)?;
        let path = session.current_dir()?;
        self.siblings = dirs.iter().map(|d| d.name.clone()).collect();
        Ok(Some(WalkRecord { path, dirs, files }))
    }
}

/// Whole-walk iterator for callers that do not need the session
/// between steps. Exhaustible exactly once - it drives stateful
/// cursor movement and cannot be restarted.
pub fn walk<'a, S: RemoteSession>(session: &'a mut S, starting_path: &str) -> Walk<'a, S> {
    Walk {
        session,
        walker: Walker::new(starting_path),
    }
}

pub struct Walk<'a, S: RemoteSession> {
    session: &'a mut S,
    walker: Walker,
}

impl<S: RemoteSession> Iterator for Walk<'_, S> {
    type Item = Result<WalkRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next_dir(self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpiderError;
    use std::collections::HashMap;
    use std::io::Write;

    fn session_err(msg: &str) -> SpiderError {
        SpiderError::Session(suppaftp::FtpError::ConnectionError(std::io::Error::new(
            std::io::ErrorKind::Other,
            msg.to_string(),
        )))
    }

    fn dir_line(name: &str) -> String {
        format!("drwxr-xr-x 9 ftp ftp 368 Jun 9 2010 {name}")
    }

    fn file_line(name: &str) -> String {
        format!("-rw-r--r-- 1 ftp ftp 1599 Apr 3 2002 {name}")
    }

    /// In-memory remote tree keyed by absolute path
    struct MockSession {
        tree: HashMap<String, Vec<String>>,
        cwd: Vec<String>,
        fail_listing_at: Option<String>,
    }

    impl MockSession {
        fn new(tree: &[(&str, Vec<String>)]) -> Self {
            Self {
                tree: tree
                    .iter()
                    .map(|(p, l)| (p.to_string(), l.clone()))
                    .collect(),
                cwd: Vec::new(),
                fail_listing_at: None,
            }
        }

        fn path(&self) -> String {
            if self.cwd.is_empty() {
                "/".to_string()
            } else {
                format!("/{}", self.cwd.join("/"))
            }
        }
    }

    impl RemoteSession for MockSession {
        fn change_dir(&mut self, path: &str) -> Result<()> {
            if let Some(abs) = path.strip_prefix('/') {
                self.cwd = abs
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            } else {
                self.cwd.push(path.to_string());
            }
            if self.tree.contains_key(&self.path()) {
                Ok(())
            } else {
                Err(session_err("no such directory"))
            }
        }

        fn up(&mut self) -> Result<()> {
            self.cwd.pop();
            Ok(())
        }

        fn current_dir(&mut self) -> Result<String> {
            Ok(self.path())
        }

        fn list_dir(&mut self) -> Result<Vec<String>> {
            let here = self.path();
            if self.fail_listing_at.as_deref() == Some(here.as_str()) {
                return Err(session_err("listing failed"));
            }
            Ok(self.tree.get(&here).cloned().unwrap_or_default())
        }

        fn retrieve(&mut self, _name: &str, _sink: &mut dyn Write) -> Result<u64> {
            Ok(0)
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn visited_paths(session: &mut MockSession, start: &str) -> Vec<String> {
        walk(session, start)
            .map(|r| r.unwrap().path)
            .collect()
    }

    #[test]
    fn visits_every_directory_once_in_preorder() {
        let mut session = MockSession::new(&[
            ("/", vec![dir_line("a"), dir_line("b"), file_line("root.txt")]),
            ("/a", vec![dir_line("a1"), dir_line("a2")]),
            ("/a/a1", vec![]),
            ("/a/a2", vec![file_line("deep.bin")]),
            ("/b", vec![]),
        ]);
        let paths = visited_paths(&mut session, "/");
        // Siblings come out in reverse listing order (stack, not queue).
        assert_eq!(paths, ["/", "/b", "/a", "/a/a2", "/a/a1"]);
    }

    #[test]
    fn cursor_returns_to_start_after_walk() {
        let mut session = MockSession::new(&[
            ("/", vec![dir_line("pub")]),
            ("/pub", vec![dir_line("sub")]),
            ("/pub/sub", vec![]),
        ]);
        let records: Vec<_> = walk(&mut session, "/").collect();
        assert_eq!(records.len(), 3);
        assert_eq!(session.path(), "/");
    }

    #[test]
    fn cursor_returns_to_nested_start() {
        let mut session = MockSession::new(&[
            ("/", vec![]),
            ("/pub", vec![dir_line("docs"), dir_line("src")]),
            ("/pub/docs", vec![]),
            ("/pub/src", vec![]),
        ]);
        let paths = visited_paths(&mut session, "/pub");
        assert_eq!(paths, ["/pub", "/pub/src", "/pub/docs"]);
        assert_eq!(session.path(), "/pub");
    }

    #[test]
    fn yields_files_with_dates() {
        let mut session = MockSession::new(&[(
            "/",
            vec![file_line("author.msg"), file_line("welcome.msg")],
        )]);
        let mut iter = walk(&mut session, "/");
        let record = iter.next().unwrap().unwrap();
        assert_eq!(record.files.len(), 2);
        assert_eq!(record.files[0].name, "author.msg");
        assert!(iter.next().is_none());
    }

    #[test]
    fn listing_failure_ends_the_walk() {
        let mut session = MockSession::new(&[
            ("/", vec![dir_line("bad"), dir_line("good")]),
            ("/bad", vec![]),
            ("/good", vec![]),
        ]);
        session.fail_listing_at = Some("/good".to_string());

        let mut walker = Walker::new("/");
        assert!(walker.next_dir(&mut session).unwrap().is_ok());
        let failed = walker.next_dir(&mut session).unwrap();
        assert!(matches!(failed, Err(SpiderError::Session(_))));
        assert!(walker.next_dir(&mut session).is_none());
    }

    #[test]
    fn missing_start_directory_fails_immediately() {
        let mut session = MockSession::new(&[("/", vec![])]);
        let mut walker = Walker::new("/nope");
        assert!(walker.next_dir(&mut session).unwrap().is_err());
        assert!(walker.next_dir(&mut session).is_none());
    }

    #[test]
    fn depth_tracks_stack_height() {
        let mut session = MockSession::new(&[
            ("/", vec![dir_line("a")]),
            ("/a", vec![dir_line("b")]),
            ("/a/b", vec![]),
        ]);
        let mut walker = Walker::new("/");
        walker.next_dir(&mut session).unwrap().unwrap();
        assert_eq!(walker.depth(), 0);
        walker.next_dir(&mut session).unwrap().unwrap();
        assert_eq!(walker.depth(), 1);
        walker.next_dir(&mut session).unwrap().unwrap();
        assert_eq!(walker.depth(), 2);
        assert!(walker.next_dir(&mut session).is_none());
    }
}
