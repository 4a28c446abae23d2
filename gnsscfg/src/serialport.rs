//! [`SerialLink`] and [`SerialSource`] for ports opened with the `serialport`
//! crate. Open the port once and give the receive side its own handle with
//! `try_clone`.

use std::{
    io::{self, Read, Write},
    time::Duration,
};

use ::serialport::{DataBits, ErrorKind, FlowControl, SerialPort, StopBits};

use crate::{
    error::LinkError,
    monitor::SerialSource,
    transport::{Parity, PortSettings, SerialLink},
};

/// Deadline used for writes when the caller does not ask for one
const BLOCKING_WRITE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

fn data_bits(bits: u8) -> Result<DataBits, ::serialport::Error> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        _ => Err(::serialport::Error::new(
            ErrorKind::InvalidInput,
            format!("unsupported number of data bits: {}", bits),
        )),
    }
}

fn stop_bits(bits: u8) -> Result<StopBits, ::serialport::Error> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        _ => Err(::serialport::Error::new(
            ErrorKind::InvalidInput,
            format!("unsupported number of stop bits: {}", bits),
        )),
    }
}

fn parity(parity: Parity) -> ::serialport::Parity {
    match parity {
        Parity::None => ::serialport::Parity::None,
        Parity::Even => ::serialport::Parity::Even,
        Parity::Odd => ::serialport::Parity::Odd,
    }
}

impl SerialLink for Box<dyn SerialPort> {
    type Error = ::serialport::Error;

    fn configure(&mut self, settings: &PortSettings) -> Result<(), Self::Error> {
        let port: &mut dyn SerialPort = self.as_mut();
        SerialPort::set_baud_rate(port, settings.baud_rate)?;
        SerialPort::set_data_bits(port, data_bits(settings.data_bits)?)?;
        SerialPort::set_stop_bits(port, stop_bits(settings.stop_bits)?)?;
        SerialPort::set_parity(port, parity(settings.parity))?;
        SerialPort::set_flow_control(port, FlowControl::None)?;
        Ok(())
    }

    /// Write and flush `bytes`.
    ///
    /// `timeout` only bounds the write. On unix `flush` waits with `tcdrain`,
    /// which ignores the port timeout, so draining the output queue can take
    /// longer than `timeout`.
    fn write_all(
        &mut self,
        bytes: &[u8],
        timeout: Option<Duration>,
    ) -> Result<(), LinkError<Self::Error>> {
        let port: &mut dyn SerialPort = self.as_mut();
        SerialPort::set_timeout(port, timeout.unwrap_or(BLOCKING_WRITE_TIMEOUT))?;

        // flush waits for the output queue to drain
        let written = Write::write_all(port, bytes).and_then(|()| Write::flush(port));
        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(LinkError::TimedOut),
            Err(e) => Err(LinkError::Io(e.into())),
        }
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), Self::Error> {
        SerialPort::set_baud_rate(self.as_mut(), baud_rate)
    }
}

impl SerialSource for Box<dyn SerialPort> {
    type Error = io::Error;

    /// Reads the serial port, converting timeouts into "no data received"
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match Read::read(self.as_mut(), buf) {
            Ok(b) => Ok(b),
            Err(e) => {
                if e.kind() == io::ErrorKind::TimedOut {
                    Ok(0)
                } else {
                    Err(e)
                }
            },
        }
    }
}
