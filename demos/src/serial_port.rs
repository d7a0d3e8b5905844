use std::collections::VecDeque;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

use nix::fcntl::OFlag;
use nix::sys::termios;

/// Raw, non-blocking serial port at 115200 baud, 8N1, no flow control.
pub struct SerialPort {
    fd: RawFd,
    rx: VecDeque<u8>,
}

impl SerialPort {
    pub fn new(path: &Path) -> io::Result<Self> {
        let fd = nix::fcntl::open(
            path,
            OFlag::O_RDWR | OFlag::O_NOCTTY | OFlag::O_NONBLOCK,
            nix::sys::stat::Mode::empty(),
        )?;

        let mut cfg = termios::tcgetattr(fd)?;
        cfg.input_flags = termios::InputFlags::empty();
        cfg.output_flags = termios::OutputFlags::empty();
        cfg.control_flags = termios::ControlFlags::empty();
        cfg.local_flags = termios::LocalFlags::empty();
        termios::cfmakeraw(&mut cfg);
        cfg.input_flags |= termios::InputFlags::IGNBRK;
        cfg.control_flags |= termios::ControlFlags::CREAD | termios::ControlFlags::CLOCAL;
        termios::cfsetspeed(&mut cfg, termios::BaudRate::B115200)?;
        termios::tcsetattr(fd, termios::SetArg::TCSANOW, &cfg)?;
        termios::tcflush(fd, termios::FlushArg::TCIOFLUSH)?;

        Ok(Self {
            fd,
            rx: VecDeque::new(),
        })
    }

    /// Moves whatever the kernel has buffered into `self.rx`.
    fn fill(&mut self) -> io::Result<()> {
        let mut buf = [0; 256];
        loop {
            match nix::unistd::read(self.fd, &mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => self.rx.extend(&buf[..n]),
                Err(nix::errno::Errno::EAGAIN) => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl AsRawFd for SerialPort {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        let _ = nix::unistd::close(self.fd);
    }
}

impl displax::Transport for SerialPort {
    type Error = io::Error;

    fn available(&mut self) -> usize {
        if self.rx.is_empty() {
            if let Err(e) = self.fill() {
                log::warn!("serial read failed: {}", e);
            }
        }
        self.rx.len()
    }

    fn read_one(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or_default()
    }

    fn write(&mut self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            match nix::unistd::write(self.fd, data) {
                Ok(n) => data = &data[n..],
                Err(nix::errno::Errno::EAGAIN) => std::thread::yield_now(),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        termios::tcdrain(self.fd)?;
        Ok(())
    }
}
