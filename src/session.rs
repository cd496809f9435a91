//! Remote session capability and its FTP-backed implementation

use std::io::{Read, Write};

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};

use crate::error::Result;

/// The remote operations the walker and spider need.
///
/// One live session drives an entire run, and no call may be issued
/// while another is outstanding. `retrieve` names a file in the
/// session's current directory; the walker keeps the cursor parked in
/// the most recently yielded directory so the controller can fetch
/// from it directly.
pub trait RemoteSession {
    fn change_dir(&mut self, path: &str) -> Result<()>;
    fn up(&mut self) -> Result<()>;
    fn current_dir(&mut self) -> Result<String>;
    fn list_dir(&mut self) -> Result<Vec<String>>;
    /// Stream the file's full contents into `sink`; returns bytes written.
    fn retrieve(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64>;
    fn close(&mut self) -> Result<()>;
}

/// FTP control connection wrapping suppaftp
pub struct FtpSession {
    stream: FtpStream,
}

impl FtpSession {
    /// Open the control connection. Call `login` before anything else.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = FtpStream::connect(format!("{host}:{port}"))?;
        Ok(Self { stream })
    }

    /// Authenticate and switch to binary transfers.
    pub fn login(&mut self, user: &str, password: &str) -> Result<()> {
        self.stream.login(user, password)?;
        self.stream.transfer_type(FileType::Binary)?;
        Ok(())
    }
}

impl RemoteSession for FtpSession {
    fn change_dir(&mut self, path: &str) -> Result<()> {
        self.stream.cwd(path)?;
        Ok(())
    }

    fn up(&mut self) -> Result<()> {
        self.stream.cdup()?;
        Ok(())
    }

    fn current_dir(&mut self) -> Result<String> {
        Ok(self.stream.pwd()?)
    }

    fn list_dir(&mut self) -> Result<Vec<String>> {
        Ok(self.stream.list(None)?)
    }

    fn retrieve(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64> {
        let mut data = self.stream.retr_as_stream(name)?;

        // Read failures are the session's; write failures are local.
        let mut buffer = [0u8; 64 * 1024];
        let mut total = 0u64;
        loop {
            let n = data.read(&mut buffer).map_err(FtpError::ConnectionError)?;
            if n == 0 {
                break;
            }
            sink.write_all(&buffer[..n])?;
            total += n as u64;
        }

        self.stream.finalize_retr_stream(data)?;
        Ok(total)
    }

    fn close(&mut self) -> Result<()> {
        self.stream.quit()?;
        Ok(())
    }
}
